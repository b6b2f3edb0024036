/*!
An owned, fully decoded CBOR data item.
*/

use super::*;

/// Major type 7 values other than floats and the break marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Simple {
    False,
    True,
    Null,
    Undefined,
    Unassigned(u8),
}

impl Simple {
    pub fn from_code(code: u8) -> Self {
        match code {
            20 => Simple::False,
            21 => Simple::True,
            22 => Simple::Null,
            23 => Simple::Undefined,
            c => Simple::Unassigned(c),
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Simple::False => 20,
            Simple::True => 21,
            Simple::Null => 22,
            Simple::Undefined => 23,
            Simple::Unassigned(c) => c,
        }
    }
}

impl From<bool> for Simple {
    fn from(value: bool) -> Self {
        if value { Simple::True } else { Simple::False }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    UInt,
    Int,
    Bytes,
    Text,
    Array,
    Map,
    Tag,
    Simple,
}

/// Negative integers decode as [`Item::Int`], everything else integral as
/// [`Item::UInt`]; the `From<i64>` conversion follows the same rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    UInt(u64),
    Int(i64),
    Bytes(Vec<u8>),
    Text(String),
    Array(Vec<Item>),
    Map(Vec<(Item, Item)>),
    Tag(u64, Box<Item>),
    Simple(Simple),
}

impl Item {
    pub fn kind(&self) -> Kind {
        match self {
            Item::UInt(_) => Kind::UInt,
            Item::Int(_) => Kind::Int,
            Item::Bytes(_) => Kind::Bytes,
            Item::Text(_) => Kind::Text,
            Item::Array(_) => Kind::Array,
            Item::Map(_) => Kind::Map,
            Item::Tag(..) => Kind::Tag,
            Item::Simple(_) => Kind::Simple,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Item::UInt(v) => Some(*v),
            Item::Int(v) => u64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Item::UInt(v) => i64::try_from(*v).ok(),
            Item::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Item::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Item::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Item]> {
        match self {
            Item::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&[(Item, Item)]> {
        match self {
            Item::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Item::Simple(Simple::True) => Some(true),
            Item::Simple(Simple::False) => Some(false),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Item::Simple(Simple::Null))
    }
}

impl From<u64> for Item {
    fn from(value: u64) -> Self {
        Item::UInt(value)
    }
}

impl From<i64> for Item {
    fn from(value: i64) -> Self {
        if value >= 0 {
            Item::UInt(value as u64)
        } else {
            Item::Int(value)
        }
    }
}

impl From<bool> for Item {
    fn from(value: bool) -> Self {
        Item::Simple(value.into())
    }
}

impl From<&str> for Item {
    fn from(value: &str) -> Self {
        Item::Text(value.to_string())
    }
}

impl From<String> for Item {
    fn from(value: String) -> Self {
        Item::Text(value)
    }
}

impl From<&[u8]> for Item {
    fn from(value: &[u8]) -> Self {
        Item::Bytes(value.to_vec())
    }
}

impl From<Vec<u8>> for Item {
    fn from(value: Vec<u8>) -> Self {
        Item::Bytes(value)
    }
}

impl From<Vec<Item>> for Item {
    fn from(value: Vec<Item>) -> Self {
        Item::Array(value)
    }
}

impl From<Simple> for Item {
    fn from(value: Simple) -> Self {
        Item::Simple(value)
    }
}

impl std::fmt::Display for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        diag::write_item(f, self, None)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn conversions() {
        assert_eq!(Item::from(5i64), Item::UInt(5));
        assert_eq!(Item::from(-5i64), Item::Int(-5));
        assert_eq!(Item::Int(-5).as_u64(), None);
        assert_eq!(Item::UInt(u64::MAX).as_i64(), None);
        assert_eq!(Item::from(true).as_bool(), Some(true));
        assert_eq!(Simple::from_code(22), Simple::Null);
        assert_eq!(Simple::from_code(99).code(), 99);
        assert_eq!(Item::from("x").kind(), Kind::Text);
    }

    #[test]
    fn display() {
        let item = Item::Map(vec![(
            Item::from("a"),
            Item::Array(vec![
                Item::UInt(1),
                Item::Int(-2),
                Item::Bytes(vec![0xde, 0xad]),
                Item::Tag(1, Box::new(Item::Simple(Simple::Null))),
            ]),
        )]);
        assert_eq!(item.to_string(), r#"{"a": [1, -2, h'dead', 1(null)]}"#);
    }
}
