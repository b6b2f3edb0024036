/*!
The registry binding integer ids to symbolic paths.

A [`Schema`] is built once, either with [`Schema::builder`] or from a
declarative [`SchemaDef`], and then shared read-only by every
[`Sender`](crate::Sender) and [`Receiver`](crate::Receiver). It only describes
the wire format: ids travel as plain unsigned integers whatever the schema
says about them.
*/

use super::*;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub id: u64,
    /// `<group>.<name>`
    pub path: String,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: u64,
    pub name: String,
    pub attributes: Vec<Attribute>,
}

impl Group {
    pub fn attribute(&self, id: u64) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.id == id)
    }

    pub fn required(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter().filter(|a| a.required)
    }
}

#[derive(Debug, Clone, Copy)]
enum Entry {
    Group(usize),
    Attribute(usize, usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeDef {
    pub id: u64,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GroupDef {
    pub id: u64,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub attributes: Vec<AttributeDef>,
}

/// The declarative form of a [`Schema`], as written in configuration files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SchemaDef {
    #[cfg_attr(feature = "serde", serde(default))]
    pub groups: Vec<GroupDef>,
}

#[derive(Debug, Clone)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "SchemaDef", into = "SchemaDef")
)]
pub struct Schema {
    groups: Vec<Group>,
    ids: HashMap<u64, Entry>,
    paths: HashMap<String, u64>,
}

fn check_name(name: &str) -> Result<(), Error> {
    let valid = !name.is_empty()
        && name.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        });
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidPath(name.to_string()))
    }
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::default()
    }

    fn bind(&mut self, id: u64, path: &str, entry: Entry) -> Result<(), Error> {
        if self.ids.contains_key(&id) {
            return Err(Error::DuplicateId(id));
        }
        if self.paths.contains_key(path) {
            return Err(Error::DuplicatePath(path.to_string()));
        }
        self.ids.insert(id, entry);
        self.paths.insert(path.to_string(), id);
        Ok(())
    }

    pub fn from_def(def: SchemaDef) -> Result<Self, Error> {
        let mut schema = Schema {
            groups: Vec::with_capacity(def.groups.len()),
            ids: HashMap::new(),
            paths: HashMap::new(),
        };
        for (g, group) in def.groups.into_iter().enumerate() {
            check_name(&group.name)?;
            schema.bind(group.id, &group.name, Entry::Group(g))?;

            let mut attributes = Vec::with_capacity(group.attributes.len());
            for (a, attr) in group.attributes.into_iter().enumerate() {
                check_name(&attr.name)?;
                let path = format!("{}.{}", group.name, attr.name);
                schema.bind(attr.id, &path, Entry::Attribute(g, a))?;
                attributes.push(Attribute {
                    id: attr.id,
                    path,
                    required: attr.required,
                });
            }
            schema.groups.push(Group {
                id: group.id,
                name: group.name,
                attributes,
            });
        }
        Ok(schema)
    }

    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.groups.iter()
    }

    pub fn group(&self, id: u64) -> Option<&Group> {
        match self.ids.get(&id)? {
            Entry::Group(g) => self.groups.get(*g),
            Entry::Attribute(..) => None,
        }
    }

    pub fn attribute(&self, id: u64) -> Option<&Attribute> {
        match self.ids.get(&id)? {
            Entry::Attribute(g, a) => self.groups.get(*g)?.attributes.get(*a),
            Entry::Group(_) => None,
        }
    }

    /// The group an attribute belongs to.
    pub fn owner(&self, id: u64) -> Option<&Group> {
        match self.ids.get(&id)? {
            Entry::Attribute(g, _) => self.groups.get(*g),
            Entry::Group(_) => None,
        }
    }

    /// The group name or attribute path bound to `id`.
    pub fn path(&self, id: u64) -> Option<&str> {
        match self.ids.get(&id)? {
            Entry::Group(g) => self.groups.get(*g).map(|g| g.name.as_str()),
            Entry::Attribute(g, a) => self
                .groups
                .get(*g)?
                .attributes
                .get(*a)
                .map(|a| a.path.as_str()),
        }
    }

    pub fn id(&self, path: &str) -> Option<u64> {
        self.paths.get(path).copied()
    }

    pub fn to_def(&self) -> SchemaDef {
        SchemaDef {
            groups: self
                .groups
                .iter()
                .map(|g| GroupDef {
                    id: g.id,
                    name: g.name.clone(),
                    attributes: g
                        .attributes
                        .iter()
                        .map(|a| AttributeDef {
                            id: a.id,
                            name: a.path[g.name.len() + 1..].to_string(),
                            required: a.required,
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

impl TryFrom<SchemaDef> for Schema {
    type Error = Error;

    fn try_from(def: SchemaDef) -> Result<Self, Self::Error> {
        Self::from_def(def)
    }
}

impl From<Schema> for SchemaDef {
    fn from(schema: Schema) -> Self {
        schema.to_def()
    }
}

#[derive(Debug, Default)]
pub struct SchemaBuilder {
    def: SchemaDef,
}

impl SchemaBuilder {
    pub fn group<F>(mut self, id: u64, name: &str, f: F) -> Self
    where
        F: FnOnce(GroupBuilder) -> GroupBuilder,
    {
        let group = f(GroupBuilder {
            def: GroupDef {
                id,
                name: name.to_string(),
                attributes: Vec::new(),
            },
        });
        self.def.groups.push(group.def);
        self
    }

    pub fn build(self) -> Result<Schema, Error> {
        Schema::from_def(self.def)
    }
}

pub struct GroupBuilder {
    def: GroupDef,
}

impl GroupBuilder {
    fn attribute(mut self, id: u64, name: &str, required: bool) -> Self {
        self.def.attributes.push(AttributeDef {
            id,
            name: name.to_string(),
            required,
        });
        self
    }

    pub fn required(self, id: u64, name: &str) -> Self {
        self.attribute(id, name, true)
    }

    pub fn optional(self, id: u64, name: &str) -> Self {
        self.attribute(id, name, false)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn routes() -> Schema {
        Schema::builder()
            .group(1, "route", |g| {
                g.required(2, "prefix")
                    .optional(3, "next_hop")
                    .optional(4, "as_path")
            })
            .group(10, "table", |g| g.optional(11, "route"))
            .build()
            .unwrap()
    }

    #[test]
    fn lookups() {
        let s = routes();
        assert_eq!(s.group(1).unwrap().name, "route");
        assert!(s.group(2).is_none());
        assert_eq!(s.attribute(2).unwrap().path, "route.prefix");
        assert!(s.attribute(2).unwrap().required);
        assert_eq!(s.owner(11).unwrap().id, 10);
        assert_eq!(s.path(4), Some("route.as_path"));
        assert_eq!(s.path(10), Some("table"));
        assert_eq!(s.path(99), None);
        assert_eq!(s.id("route.next_hop"), Some(3));
        assert_eq!(
            s.group(1).unwrap().required().map(|a| a.id).collect::<Vec<_>>(),
            [2]
        );
    }

    #[test]
    fn duplicates() {
        assert!(matches!(
            Schema::builder()
                .group(1, "a", |g| g.optional(1, "b"))
                .build(),
            Err(Error::DuplicateId(1))
        ));
        assert!(matches!(
            Schema::builder()
                .group(1, "a", |g| g.optional(2, "b"))
                .group(3, "a", |g| g)
                .build(),
            Err(Error::DuplicatePath(_))
        ));
    }

    #[test]
    fn names() {
        for bad in ["", "a..b", ".a", "a b", "a/b"] {
            assert!(matches!(
                Schema::builder().group(1, bad, |g| g).build(),
                Err(Error::InvalidPath(_))
            ));
        }
        let s = Schema::builder()
            .group(1, "bgp.route", |g| g.optional(2, "attr.local_pref"))
            .build()
            .unwrap();
        assert_eq!(s.id("bgp.route.attr.local_pref"), Some(2));
        assert_eq!(s.to_def().groups[0].attributes[0].name, "attr.local_pref");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn from_json() {
        let s: Schema = serde_json::from_str(
            r#"{"groups": [{"id": 1, "name": "route", "attributes": [
                {"id": 2, "name": "prefix", "required": true},
                {"id": 3, "name": "med"}
            ]}]}"#,
        )
        .unwrap();
        assert_eq!(s.path(3), Some("route.med"));
        assert!(!s.attribute(3).unwrap().required);

        assert!(
            serde_json::from_str::<Schema>(r#"{"groups": [{"id": 1, "name": "x"}, {"id": 1, "name": "y"}]}"#)
                .is_err()
        );
    }
}
