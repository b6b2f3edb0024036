use super::*;
use cbor::{
    decode::{Decoder, FromCbor},
    item::Item,
};
use std::collections::HashSet;

/// What [`Receiver::recv_group_end`] checks before closing a group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Validation {
    /// Accept groups whatever attributes they carry.
    #[default]
    None,
    /// Fail with [`Error::MissingRequired`] when a required attribute never appeared.
    Required,
}

struct OpenGroup {
    id: u64,
    seen: HashSet<u64>,
}

/// Reads keyed records through a [`Decoder`].
///
/// Attributes arrive in whatever order the sender chose; loop on
/// [`Receiver::recv_key`] and dispatch on the id.
pub struct Receiver<'a> {
    decoder: &'a mut Decoder,
    schema: &'a Schema,
    validation: Validation,
    open: Vec<OpenGroup>,
}

impl<'a> Receiver<'a> {
    pub fn new(decoder: &'a mut Decoder, schema: &'a Schema) -> Self {
        Self {
            decoder,
            schema,
            validation: Validation::None,
            open: Vec::new(),
        }
    }

    pub fn with_validation(mut self, validation: Validation) -> Self {
        self.validation = validation;
        self
    }

    pub fn schema(&self) -> &Schema {
        self.schema
    }

    pub fn decoder(&mut self) -> &mut Decoder {
        self.decoder
    }

    /// Opens the next group, whatever its id, and returns the id.
    ///
    /// Returns `Ok(None)` when the current container, or the input, has no
    /// more items.
    pub fn recv_any_group(&mut self) -> Result<Option<u64>, Error> {
        if self.decoder.at_end()? {
            return Ok(None);
        }
        // Groups are sent indefinite, but a definite array is just as readable
        self.decoder.decode_array_begin()?;
        let id = self.decoder.decode_uint64()?;
        match self.schema.group(id) {
            Some(group) => debug!("Receiving group {id} '{}'", group.name),
            None => warn!("Receiving unknown group {id}"),
        }
        self.open.push(OpenGroup {
            id,
            seen: HashSet::new(),
        });
        Ok(Some(id))
    }

    pub fn recv_group(&mut self, id: u64) -> Result<(), Error> {
        match self.recv_any_group()? {
            Some(found) if found == id => Ok(()),
            Some(found) => Err(Error::UnexpectedGroup {
                expected: id,
                found,
            }),
            None => Err(cbor::Error::NoMore.into()),
        }
    }

    /// The next attribute id, or `None` once the group has no more.
    pub fn recv_key(&mut self) -> Result<Option<u64>, Error> {
        let Some(group) = self.open.last_mut() else {
            return Err(Error::NoGroup);
        };
        if self.decoder.at_end()? {
            return Ok(None);
        }
        let id = self.decoder.decode_uint64()?;
        if self.schema.owner(id).is_none_or(|g| g.id != group.id) {
            warn!("Received id {id}, which is not an attribute of group {}", group.id);
        }
        group.seen.insert(id);
        Ok(Some(id))
    }

    pub fn recv<T: FromCbor>(&mut self) -> Result<T, Error> {
        Ok(self.decoder.decode()?)
    }

    pub fn recv_item(&mut self) -> Result<Item, Error> {
        Ok(self.decoder.decode_item()?)
    }

    /// Discards the value of the attribute just received.
    pub fn skip(&mut self) -> Result<(), Error> {
        Ok(self.decoder.skip_item()?)
    }

    pub fn recv_group_end(&mut self) -> Result<(), Error> {
        if self.open.is_empty() {
            return Err(Error::NoGroup);
        }
        // The group is closed on the wire before it is checked, so the next
        // group can still be received after a validation failure
        self.decoder.decode_array_end()?;
        let group = self.open.pop().ok_or(Error::NoGroup)?;
        debug!("Received end of group {}", group.id);
        if self.validation == Validation::Required {
            if let Some(def) = self.schema.group(group.id) {
                if let Some(missing) = def.required().find(|a| !group.seen.contains(&a.id)) {
                    return Err(Error::MissingRequired {
                        group: def.name.clone(),
                        path: missing.path.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Receives a whole group, calling `f` with each attribute id.
    ///
    /// `f` must consume the attribute's value, with [`Receiver::recv`],
    /// [`Receiver::skip`] or a nested group.
    pub fn recv_group_with<F, E>(&mut self, id: u64, mut f: F) -> Result<(), E>
    where
        F: FnMut(&mut Self, u64) -> Result<(), E>,
        E: From<Error>,
    {
        self.recv_group(id)?;
        while let Some(key) = self.recv_key()? {
            f(self, key)?;
        }
        self.recv_group_end()?;
        Ok(())
    }
}
