//! Itanium substitution table (`S_`, `S0_`, ...).

use linkspan_core::{DeclId, NameComponent, TypeRef};

/// Identity of a substitutable entity.
///
/// Class types and the prefixes naming them share the `Name` variant, so a
/// class introduced as a prefix is found again when used as a parameter type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum SubstKey {
    Name {
        local: Option<DeclId>,
        path: Vec<NameComponent>,
    },
    Type(TypeRef),
}

#[derive(Debug, Default)]
pub(crate) struct SubstitutionTable {
    entries: Vec<SubstKey>,
}

impl SubstitutionTable {
    /// Encoding of an existing entry, if `key` has been seen.
    pub(crate) fn lookup(&self, key: &SubstKey) -> Option<String> {
        self.entries
            .iter()
            .position(|entry| entry == key)
            .map(encode_seq_id)
    }

    pub(crate) fn add(&mut self, key: SubstKey) {
        if !self.entries.contains(&key) {
            self.entries.push(key);
        }
    }
}

/// `S_` for the first entry, then `S<base36(n - 1)>_`.
fn encode_seq_id(index: usize) -> String {
    if index == 0 {
        return "S_".to_string();
    }
    let mut n = index - 1;
    let mut digits = Vec::new();
    loop {
        let digit = (n % 36) as u8;
        digits.push(if digit < 10 {
            b'0' + digit
        } else {
            b'A' + digit - 10
        });
        n /= 36;
        if n == 0 {
            break;
        }
    }
    digits.reverse();
    format!("S{}_", String::from_utf8_lossy(&digits))
}
