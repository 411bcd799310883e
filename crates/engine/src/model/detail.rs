use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

/// Where a variable's bytes live (spec §3 "Variable").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Location {
    Stack,
    Memory,
    Storage,
    CallData,
}

/// Primitive leaf kinds a [`Detail::Value`] can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    Boolean,
    Unsigned,
    Signed,
    Address,
    FixedBytes,
}

/// Post-placement position of a detail node. Populated by `applyPositions`
/// (spec §4.2); `Unset` only ever appears transiently during construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Position {
    Unset,
    /// Value types on the stack always sit at the variable's own depth;
    /// this variant carries no extra offset (spec: "position = 0").
    Stack,
    /// Byte offset from the variable's memory base pointer.
    Memory(u64),
    /// Storage slot plus the intra-slot byte offset a value's low byte
    /// starts at (0 for anything that isn't densely packed).
    Storage { slot: U256, offset: u8 },
}

/// A leaf scalar value (spec §3 "Value" detail variant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueDetail {
    pub kind: ValueKind,
    /// Byte width of the encoded value, 1..=32.
    pub width: u8,
    pub position: Position,
}

/// A fixed- or dynamic-length array (spec §3 "Array" detail variant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrayDetail {
    pub is_dynamic: bool,
    /// Declared length; 0 for dynamic arrays until observed.
    pub length: u64,
    pub element: Box<Detail>,
    /// Pre-materialized element nodes for fixed-size arrays.
    pub members: Option<Vec<Detail>>,
    pub location_override: Option<Location>,
    /// Storage only: true if this array node is itself a pointer (as
    /// opposed to inline data), mirroring solc's `storage pointer` vs
    /// `storage ref` distinction.
    pub is_pointer: bool,
    pub position: Position,
}

/// A struct's ordered members (spec §3 "Struct" detail variant).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StructDetail {
    pub members: Vec<(String, Detail)>,
    pub position: Position,
}

/// A mapping's key/value detail pair (spec §3 "Mapping" detail variant).
///
/// `key`/`value` are templates: their own `position` fields stay `Unset`
/// forever, since a mapping has no fixed member positions, only a base
/// slot that a per-key lookup combines with the key bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingDetail {
    pub key: Box<Detail>,
    pub value: Box<Detail>,
    pub position: Position,
}

/// The recursive detail tree described in spec §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Detail {
    Value(ValueDetail),
    Array(ArrayDetail),
    Struct(StructDetail),
    Mapping(MappingDetail),
}

impl Detail {
    pub fn position(&self) -> Position {
        match self {
            Self::Value(v) => v.position,
            Self::Array(a) => a.position,
            Self::Struct(s) => s.position,
            Self::Mapping(m) => m.position,
        }
    }

    /// Collapses `position()` into the single `u64` `Variable::position`
    /// carries: 0 for stack, the byte offset for memory, the slot number
    /// for storage (slots beyond `u64::MAX` are not addressable this way,
    /// but no realistic contract has that many declared state variables).
    pub fn position_u64(&self) -> Option<u64> {
        match self.position() {
            Position::Unset => None,
            Position::Stack => Some(0),
            Position::Memory(offset) => Some(offset),
            Position::Storage { slot, .. } => u64::try_from(slot).ok(),
        }
    }

    /// A stable id used as `variablesReference` for lazy expansion (spec
    /// §4.8): zero for leaves, a non-zero id for anything with children.
    pub fn variables_reference(&self, self_id: u64) -> u64 {
        match self {
            Self::Value(_) => 0,
            _ => self_id,
        }
    }
}
