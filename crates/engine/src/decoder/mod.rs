//! Lexical type recognition and value decoding (spec §4.2 "Variable
//! decoding").
//!
//! Three stages, run in order for every `VariableDeclaration` the step
//! engine newly brings into scope: [`parse_type`] builds an unpositioned
//! `Detail` skeleton from the Solidity type string; [`apply_positions`]
//! walks that skeleton post-order, handing out stack slots, memory offsets,
//! or storage slot/offset pairs; then [`decode`] reads the actual bytes out
//! of a step's [`crate::model::step_data::RawVmState`].

use alloy_primitives::{keccak256, Address, U256};

use crate::error::EngineError;
use crate::model::detail::{ArrayDetail, Detail, Location, MappingDetail, Position, StructDetail, ValueDetail, ValueKind};
use crate::model::step_data::RawVmState;

/// Resolves a user-defined type name (`Contract.StructName` or an enum) to
/// its ordered member list, so `parse_type` can recurse into structs
/// without needing the full AST in scope.
pub trait TypeResolver {
    fn resolve_struct(&self, name: &str) -> Option<Vec<(String, String)>>;
}

/// Parses a solc `typeString` (e.g. `"uint256"`, `"address[] storage ref"`,
/// `"mapping(address => uint256)"`) into an unpositioned `Detail` skeleton.
pub fn parse_type(type_string: &str, resolver: &dyn TypeResolver) -> eyre::Result<Detail> {
    let trimmed = strip_data_location(type_string);

    if let Some(inner) = trimmed.strip_prefix("mapping(") {
        let inner = inner.strip_suffix(')').unwrap_or(inner);
        let (key_ty, value_ty) = split_arrow(inner)
            .ok_or_else(|| EngineError::Decoding(format!("malformed mapping type: {type_string}")))?;
        return Ok(Detail::Mapping(MappingDetail {
            key: Box::new(parse_type(key_ty.trim(), resolver)?),
            value: Box::new(parse_type(value_ty.trim(), resolver)?),
            position: Position::Unset,
        }));
    }

    if let Some((elem_ty, len)) = split_array_suffix(trimmed) {
        let element = Box::new(parse_type(elem_ty, resolver)?);
        let is_dynamic = len.is_none();
        let length = len.unwrap_or(0);
        let members = (!is_dynamic).then(|| vec![(*element).clone(); length as usize]);
        return Ok(Detail::Array(ArrayDetail {
            is_dynamic,
            length,
            element,
            members,
            location_override: None,
            is_pointer: false,
            position: Position::Unset,
        }));
    }

    if trimmed == "bytes" || trimmed == "string" {
        return Ok(Detail::Array(ArrayDetail {
            is_dynamic: true,
            length: 0,
            element: Box::new(Detail::Value(ValueDetail { kind: ValueKind::FixedBytes, width: 1, position: Position::Unset })),
            members: None,
            location_override: None,
            is_pointer: false,
            position: Position::Unset,
        }));
    }

    if let Some(members) = resolver.resolve_struct(trimmed) {
        let fields = members
            .into_iter()
            .map(|(name, ty)| parse_type(&ty, resolver).map(|d| (name, d)))
            .collect::<eyre::Result<Vec<_>>>()?;
        return Ok(Detail::Struct(StructDetail { members: fields, position: Position::Unset }));
    }

    parse_primitive(trimmed)
        .ok_or_else(|| EngineError::Decoding(format!("unrecognized type: {type_string}")).into())
}

fn parse_primitive(ty: &str) -> Option<Detail> {
    let (kind, width) = if ty == "bool" {
        (ValueKind::Boolean, 32)
    } else if ty == "address" || ty == "address payable" {
        (ValueKind::Address, 20)
    } else if let Some(bits) = ty.strip_prefix("uint") {
        (ValueKind::Unsigned, parse_width_bits(bits)?)
    } else if let Some(bits) = ty.strip_prefix("int") {
        (ValueKind::Signed, parse_width_bits(bits)?)
    } else if let Some(bytes) = ty.strip_prefix("bytes") {
        (ValueKind::FixedBytes, bytes.parse::<u8>().ok()?)
    } else {
        return None;
    };
    Some(Detail::Value(ValueDetail { kind, width, position: Position::Unset }))
}

fn parse_width_bits(bits: &str) -> Option<u8> {
    if bits.is_empty() {
        return Some(32);
    }
    bits.parse::<u16>().ok().map(|b| (b / 8) as u8)
}

fn strip_data_location(ty: &str) -> &str {
    for suffix in [" storage ref", " storage pointer", " memory", " calldata", " storage"] {
        if let Some(stripped) = ty.strip_suffix(suffix) {
            return stripped;
        }
    }
    ty
}

fn split_array_suffix(ty: &str) -> Option<(&str, Option<u64>)> {
    let ty = ty.trim_end();
    let close = ty.strip_suffix(']')?;
    let open = close.rfind('[')?;
    let (elem, len) = (&close[..open], &close[open + 1..]);
    if len.is_empty() {
        Some((elem, None))
    } else {
        len.parse::<u64>().ok().map(|n| (elem, Some(n)))
    }
}

fn split_arrow(s: &str) -> Option<(&str, &str)> {
    s.split_once("=>")
}

/// Tracks the running storage slot/offset cursor used while assigning
/// storage positions, implementing Solidity's packing rule: a value is
/// packed into the current slot if it fits in the remaining bytes,
/// otherwise a new slot is started (spec §4.2 "Storage packing").
#[derive(Debug, Clone, Copy, Default)]
pub struct StorageCursor {
    pub slot: U256,
    pub offset: u8,
}

impl StorageCursor {
    /// Reserves `width` bytes, returning the `(slot, offset)` they start
    /// at, and always leaves the cursor at a slot boundary for whatever
    /// comes next if `align` is set (structs/arrays always start a fresh
    /// slot; scalars don't).
    fn allocate(&mut self, width: u8) -> (U256, u8) {
        if self.offset + width > 32 {
            self.slot += U256::from(1);
            self.offset = 0;
        }
        let placed = (self.slot, self.offset);
        self.offset += width;
        placed
    }

    fn align_to_slot(&mut self) {
        if self.offset != 0 {
            self.slot += U256::from(1);
            self.offset = 0;
        }
    }
}

/// Walks `detail` post-order, assigning `Position`s. `memory_base` is the
/// running byte cursor for `Location::Memory`; ignored otherwise.
pub fn apply_positions(detail: &mut Detail, location: Location, storage: &mut StorageCursor, memory_base: &mut u64) -> eyre::Result<()> {
    match (detail, location) {
        (Detail::Value(v), Location::Stack) | (Detail::Value(v), Location::CallData) => {
            v.position = Position::Stack;
        }
        (Detail::Value(v), Location::Memory) => {
            v.position = Position::Memory(*memory_base);
            *memory_base += 32;
        }
        (Detail::Value(v), Location::Storage) => {
            let (slot, offset) = storage.allocate(v.width);
            v.position = Position::Storage { slot, offset };
        }
        (Detail::Array(a), Location::Storage) => {
            storage.align_to_slot();
            let (slot, _) = storage.allocate(32);
            a.position = Position::Storage { slot, offset: 0 };
            a.is_pointer = a.is_dynamic;
            if !a.is_dynamic {
                let mut inner = StorageCursor { slot, offset: 0 };
                if let Some(members) = a.members.as_mut() {
                    for member in members.iter_mut() {
                        apply_positions(member, location, &mut inner, memory_base)?;
                    }
                }
            }
        }
        (Detail::Array(a), Location::Memory) => {
            a.position = Position::Memory(*memory_base);
            *memory_base += 32;
            if let Some(members) = a.members.as_mut() {
                for member in members.iter_mut() {
                    apply_positions(member, location, storage, memory_base)?;
                }
            }
        }
        (Detail::Array(a), _) => {
            a.position = Position::Stack;
        }
        (Detail::Struct(s), Location::Storage) => {
            storage.align_to_slot();
            let (slot, _) = storage.allocate(32);
            s.position = Position::Storage { slot, offset: 0 };
            let mut inner = StorageCursor { slot, offset: 0 };
            for (_, member) in s.members.iter_mut() {
                apply_positions(member, location, &mut inner, memory_base)?;
            }
        }
        (Detail::Struct(s), Location::Memory) => {
            s.position = Position::Memory(*memory_base);
            for (_, member) in s.members.iter_mut() {
                apply_positions(member, location, storage, memory_base)?;
                *memory_base += 32;
            }
        }
        (Detail::Struct(s), _) => {
            s.position = Position::Stack;
        }
        (Detail::Mapping(m), _) => {
            // Mappings only ever live in storage: they consume exactly one
            // slot (never packed with a neighbor), and that slot is only
            // ever combined with a key's bytes, never read directly.
            storage.align_to_slot();
            let (slot, _) = storage.allocate(32);
            m.position = Position::Storage { slot, offset: 0 };
        }
    }
    Ok(())
}

/// A decoded scalar, ready for JSON serialization by the facade.
#[derive(Debug, Clone)]
pub enum DecodedValue {
    Bool(bool),
    Unsigned(U256),
    Signed(alloy_primitives::I256),
    Address(Address),
    Bytes(Vec<u8>),
}

/// Decodes a single [`ValueDetail`] out of `raw`, per its `position`.
pub fn decode_value(detail: &ValueDetail, raw: &RawVmState) -> eyre::Result<DecodedValue> {
    let bytes = match detail.position {
        Position::Unset => return Err(EngineError::Decoding("value has no assigned position".into()).into()),
        Position::Stack => {
            let slot = raw
                .stack
                .last()
                .ok_or_else(|| EngineError::Decoding("stack underflow decoding value".into()))?;
            slot.to_be_bytes::<32>().to_vec()
        }
        Position::Memory(offset) => read_memory(raw, offset as usize, 32)?,
        Position::Storage { slot, offset } => {
            let word = raw.storage.get(&slot).copied().unwrap_or_default();
            let be = word.to_be_bytes::<32>();
            let start = 32 - offset as usize - detail.width as usize;
            be[start..start + detail.width as usize].to_vec()
        }
    };
    decode_scalar(detail.kind, detail.width, &bytes)
}

fn decode_scalar(kind: ValueKind, width: u8, bytes: &[u8]) -> eyre::Result<DecodedValue> {
    let tail = &bytes[bytes.len().saturating_sub(width as usize)..];
    Ok(match kind {
        ValueKind::Boolean => DecodedValue::Bool(tail.last().copied().unwrap_or(0) != 0),
        ValueKind::Unsigned => DecodedValue::Unsigned(U256::from_be_slice(tail)),
        ValueKind::Signed => DecodedValue::Signed(alloy_primitives::I256::from_be_bytes({
            let mut buf = [0u8; 32];
            buf[32 - tail.len()..].copy_from_slice(tail);
            buf
        })),
        ValueKind::Address => {
            let mut buf = [0u8; 20];
            let start = tail.len().saturating_sub(20);
            buf[20 - (tail.len() - start)..].copy_from_slice(&tail[start..]);
            DecodedValue::Address(Address::from(buf))
        }
        ValueKind::FixedBytes => DecodedValue::Bytes(bytes[..width as usize].to_vec()),
    })
}

fn read_memory(raw: &RawVmState, offset: usize, len: usize) -> eyre::Result<Vec<u8>> {
    if offset + len > raw.memory.len() {
        return Err(EngineError::Decoding(format!("memory read [{offset}, {}) out of bounds", offset + len)).into());
    }
    Ok(raw.memory[offset..offset + len].to_vec())
}

/// Decodes a dynamic `bytes`/`string` stored at `slot`, applying solc's
/// length low-bit encoding: an even last byte means the data is inline
/// (length = last_byte / 2); an odd one means the data lives at
/// `keccak256(slot)` (length = (word - 1) / 2) (spec §4.2 "Dynamic bytes
/// and string decoding").
pub fn decode_storage_bytes(raw: &RawVmState, slot: U256) -> eyre::Result<Vec<u8>> {
    let word = raw.storage.get(&slot).copied().unwrap_or_default();
    let be = word.to_be_bytes::<32>();
    let last = be[31];
    if last & 1 == 0 {
        let len = (last / 2) as usize;
        Ok(be[..len].to_vec())
    } else {
        let len = ((word - U256::from(1)) / U256::from(2)).to::<u64>() as usize;
        let base = U256::from_be_bytes(keccak256(be).0);
        let mut out = Vec::with_capacity(len);
        let mut remaining = len;
        let mut cursor = base;
        while remaining > 0 {
            let word = raw.storage.get(&cursor).copied().unwrap_or_default();
            let chunk = remaining.min(32);
            out.extend_from_slice(&word.to_be_bytes::<32>()[..chunk]);
            remaining -= chunk;
            cursor += U256::from(1);
        }
        Ok(out)
    }
}

/// The storage slot an array's elements start at: `keccak256(slot)` for
/// dynamic arrays and `bytes`/`string`, the slot itself for fixed arrays
/// (spec §4.2 "Array element slots").
pub fn array_element_base_slot(slot: U256, is_dynamic: bool) -> U256 {
    if is_dynamic {
        U256::from_be_bytes(keccak256(slot.to_be_bytes::<32>()).0)
    } else {
        slot
    }
}

/// The storage slot a mapping's value lives at for a given key:
/// `keccak256(key ++ slot)`, big-endian, left-padded to 32 bytes each
/// (spec §4.2 "Mapping slot computation").
pub fn mapping_value_slot(key_bytes: &[u8], slot: U256) -> U256 {
    let mut buf = Vec::with_capacity(64);
    let mut padded_key = [0u8; 32];
    let start = 32usize.saturating_sub(key_bytes.len());
    padded_key[start..].copy_from_slice(&key_bytes[key_bytes.len().saturating_sub(32)..]);
    buf.extend_from_slice(&padded_key);
    buf.extend_from_slice(&slot.to_be_bytes::<32>());
    U256::from_be_bytes(keccak256(buf).0)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoStructs;
    impl TypeResolver for NoStructs {
        fn resolve_struct(&self, _name: &str) -> Option<Vec<(String, String)>> {
            None
        }
    }

    #[test]
    fn parses_primitives() {
        assert!(matches!(parse_type("bool", &NoStructs).unwrap(), Detail::Value(ValueDetail { kind: ValueKind::Boolean, width: 32, .. })));
        assert!(matches!(parse_type("uint256", &NoStructs).unwrap(), Detail::Value(ValueDetail { kind: ValueKind::Unsigned, width: 32, .. })));
        assert!(matches!(parse_type("uint8", &NoStructs).unwrap(), Detail::Value(ValueDetail { kind: ValueKind::Unsigned, width: 1, .. })));
        assert!(matches!(parse_type("address", &NoStructs).unwrap(), Detail::Value(ValueDetail { kind: ValueKind::Address, width: 20, .. })));
    }

    #[test]
    fn parses_dynamic_array_and_mapping() {
        let arr = parse_type("uint256[] storage ref", &NoStructs).unwrap();
        assert!(matches!(arr, Detail::Array(ArrayDetail { is_dynamic: true, .. })));

        let map = parse_type("mapping(address => uint256)", &NoStructs).unwrap();
        assert!(matches!(map, Detail::Mapping(_)));
    }

    #[test]
    fn storage_cursor_packs_then_rolls_over() {
        let mut cursor = StorageCursor::default();
        let (s0, o0) = cursor.allocate(20);
        let (s1, o1) = cursor.allocate(8);
        let (s2, _) = cursor.allocate(8);
        assert_eq!((s0, o0), (U256::ZERO, 0));
        assert_eq!((s1, o1), (U256::ZERO, 20));
        assert_eq!(s2, U256::from(1));
    }

    #[test]
    fn inline_short_bytes_roundtrip() {
        let mut raw = RawVmState::default();
        let mut word = [0u8; 32];
        word[0] = b'h';
        word[1] = b'i';
        word[31] = 4; // length 2, even => inline
        raw.storage.insert(U256::ZERO, U256::from_be_bytes(word));
        let decoded = decode_storage_bytes(&raw, U256::ZERO).unwrap();
        assert_eq!(decoded, b"hi");
    }
}
