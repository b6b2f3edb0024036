use super::*;
use cbor::{encode::{Encoder, ToCbor}, item::Item};

/// Writes keyed records through an [`Encoder`].
///
/// A group is an indefinite-length array holding the group id followed by
/// alternating attribute ids and values. An attribute value may itself be a
/// group.
pub struct Sender<'a> {
    encoder: &'a mut Encoder,
    schema: &'a Schema,
    open: Vec<u64>,
}

impl<'a> Sender<'a> {
    pub fn new(encoder: &'a mut Encoder, schema: &'a Schema) -> Self {
        Self {
            encoder,
            schema,
            open: Vec::new(),
        }
    }

    pub fn schema(&self) -> &Schema {
        self.schema
    }

    /// The encoder underneath, for values that are not a single [`ToCbor`].
    pub fn encoder(&mut self) -> &mut Encoder {
        self.encoder
    }

    pub fn send_group(&mut self, id: u64) -> Result<(), Error> {
        let group = self.schema.group(id).ok_or(Error::UnknownGroup(id))?;
        debug!("Sending group {id} '{}'", group.name);
        self.encoder.encode_array_begin_indef()?;
        self.encoder.encode_uint(id)?;
        self.open.push(id);
        Ok(())
    }

    pub fn send_key(&mut self, id: u64) -> Result<(), Error> {
        let group = *self.open.last().ok_or(Error::NoGroup)?;
        if self.schema.owner(id).is_none_or(|g| g.id != group) {
            warn!("Sending id {id}, which is not an attribute of group {group}");
        }
        self.encoder.encode_uint(id)?;
        Ok(())
    }

    pub fn send<T>(&mut self, id: u64, value: &T) -> Result<(), Error>
    where
        T: ToCbor + ?Sized,
    {
        self.send_key(id)?;
        value.to_cbor(self.encoder)?;
        Ok(())
    }

    pub fn send_item(&mut self, id: u64, item: &Item) -> Result<(), Error> {
        self.send_key(id)?;
        self.encoder.encode_item(item)?;
        Ok(())
    }

    pub fn send_group_end(&mut self) -> Result<(), Error> {
        let id = self.open.pop().ok_or(Error::NoGroup)?;
        self.encoder.encode_array_end()?;
        debug!("Sent end of group {id}");
        Ok(())
    }

    /// Sends a whole group, calling `f` to send its attributes.
    pub fn send_group_with<F, E>(&mut self, id: u64, f: F) -> Result<(), E>
    where
        F: FnOnce(&mut Self) -> Result<(), E>,
        E: From<Error>,
    {
        self.send_group(id)?;
        f(self)?;
        self.send_group_end()?;
        Ok(())
    }
}
