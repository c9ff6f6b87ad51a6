//! # Fractional z-index
//!
//! Paint order keys are strings compared lexicographically (byte-wise). Between any two generated keys
//! there is always room for another, so inserting a shape never renumbers the existing ones.
//!
//! Keys are read as base-62 fractions over `0-9A-Za-z`, whose ASCII order matches digit order.
//! Generated keys never end in `0`, the smallest digit: a key `k` and `k + "0"` would have no key between them.

/// Digits in ascending ASCII order.
const DIGITS: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
/// Default key for the first shape of an empty document.
const FIRST: &str = "a0";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ZIndexError {
    #[error("lower bound {lo:?} is not below upper bound {hi:?}")]
    OutOfOrder { lo: String, hi: String },
    #[error("no key fits between {lo:?} and {hi:?}")]
    NoRoom { lo: String, hi: String },
    #[error("invalid digit {0:#04x} in key")]
    InvalidDigit(u8),
}

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ZIndex(String);
impl ZIndex {
    /// Wrap an existing key. Any string of base-62 digits is valid.
    pub fn new(key: impl Into<String>) -> Result<Self, ZIndexError> {
        let key = key.into();
        if let Some(&bad) = key.as_bytes().iter().find(|b| digit_value(**b).is_none()) {
            return Err(ZIndexError::InvalidDigit(bad));
        }
        Ok(Self(key))
    }
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
    /// Key for the very first element of an empty sequence.
    #[must_use]
    pub fn first() -> Self {
        Self(FIRST.to_owned())
    }
    /// A key strictly after `self`.
    #[must_use]
    pub fn after(&self) -> Self {
        Self::between(Some(self), None).unwrap_or_else(|_| {
            // A non-zero digit appended always sorts above the key itself.
            let mut key = self.0.clone();
            key.push(char::from(DIGITS[DIGITS.len() / 2]));
            Self(key)
        })
    }
    /// A key strictly before `self`, if any exists.
    pub fn before(&self) -> Result<Self, ZIndexError> {
        Self::between(None, Some(self))
    }
    /// Generate a key strictly between the bounds. `None` is an open bound.
    pub fn between(lo: Option<&Self>, hi: Option<&Self>) -> Result<Self, ZIndexError> {
        match (lo, hi) {
            (None, None) => Ok(Self::first()),
            (Some(lo), Some(hi)) if lo >= hi => Err(ZIndexError::OutOfOrder {
                lo: lo.0.clone(),
                hi: hi.0.clone(),
            }),
            _ => {
                let lo_bytes = lo.map_or(&[][..], |lo| lo.0.as_bytes());
                let hi_bytes = hi.map(|hi| hi.0.as_bytes());
                let key = midpoint(lo_bytes, hi_bytes).ok_or_else(|| ZIndexError::NoRoom {
                    lo: lo.map(|k| k.0.clone()).unwrap_or_default(),
                    hi: hi.map(|k| k.0.clone()).unwrap_or_default(),
                })?;
                // Digits always come from DIGITS.
                Ok(Self(String::from_utf8(key).unwrap_or_default()))
            }
        }
    }
}
impl std::fmt::Display for ZIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
impl TryFrom<String> for ZIndex {
    type Error = ZIndexError;
    fn try_from(key: String) -> Result<Self, Self::Error> {
        Self::new(key)
    }
}
impl From<ZIndex> for String {
    fn from(key: ZIndex) -> Self {
        key.0
    }
}
impl std::fmt::Debug for ZIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "z{:?}", self.0)
    }
}
impl Default for ZIndex {
    fn default() -> Self {
        Self::first()
    }
}

fn digit_value(byte: u8) -> Option<usize> {
    match byte {
        b'0'..=b'9' => Some(usize::from(byte - b'0')),
        b'A'..=b'Z' => Some(usize::from(byte - b'A') + 10),
        b'a'..=b'z' => Some(usize::from(byte - b'a') + 36),
        _ => None,
    }
}

/// Midpoint of two base-62 fractions. `lo` may be empty (zero), `hi` None (one).
/// Requires `lo < hi`. None if the only keys between differ by trailing zeros.
fn midpoint(lo: &[u8], hi: Option<&[u8]>) -> Option<Vec<u8>> {
    if let Some(hi) = hi {
        // Strip the common prefix, padding lo with zeros.
        let common = hi
            .iter()
            .enumerate()
            .take_while(|&(idx, &h)| lo.get(idx).copied().unwrap_or(DIGITS[0]) == h)
            .count();
        if common > 0 {
            let mut key = hi[..common].to_vec();
            key.extend(midpoint(lo.get(common..).unwrap_or_default(), Some(&hi[common..]))?);
            return Some(key);
        }
    }
    // First digits differ.
    let digit_lo = lo.first().map_or(Some(0), |d| digit_value(*d))?;
    let digit_hi = match hi {
        Some(hi) => digit_value(*hi.first()?)?,
        None => DIGITS.len(),
    };
    if digit_hi > digit_lo + 1 {
        let mid = (digit_lo + digit_hi + 1) / 2;
        Some(vec![DIGITS[mid]])
    } else if let Some(hi) = hi.filter(|hi| hi.len() > 1) {
        // Consecutive first digits, but hi continues - its first digit alone sits between.
        Some(vec![hi[0]])
    } else {
        // Consecutive, take lo's digit and find room above the rest of lo.
        let mut key = vec![DIGITS[digit_lo]];
        key.extend(midpoint(lo.get(1..).unwrap_or_default(), None)?);
        Some(key)
    }
}

#[cfg(test)]
mod test {
    use super::{ZIndex, ZIndexError};
    fn z(s: &str) -> ZIndex {
        ZIndex::new(s).unwrap()
    }

    #[test]
    fn lexicographic_insertion() {
        // Hand-written keys order as plain strings.
        assert!(z("a0") < z("a05"));
        assert!(z("a05") < z("a1"));

        let mid = ZIndex::between(Some(&z("a0")), Some(&z("a1"))).unwrap();
        assert!(z("a0") < mid && mid < z("a1"), "{mid:?}");
    }
    #[test]
    fn open_bounds() {
        let first = ZIndex::between(None, None).unwrap();
        assert_eq!(first, z("a0"));
        let after = first.after();
        assert!(after > first);
        let before = first.before().unwrap();
        assert!(before < first);
    }
    #[test]
    fn repeated_bisection_never_collides() {
        let lo = z("a0");
        let mut hi = z("a1");
        for _ in 0..200 {
            let mid = ZIndex::between(Some(&lo), Some(&hi)).unwrap();
            assert!(lo < mid && mid < hi, "{lo:?} < {mid:?} < {hi:?}");
            hi = mid;
        }
        let mut lo = z("a0");
        let hi = z("a1");
        for _ in 0..200 {
            let mid = ZIndex::between(Some(&lo), Some(&hi)).unwrap();
            assert!(lo < mid && mid < hi, "{lo:?} < {mid:?} < {hi:?}");
            lo = mid;
        }
    }
    #[test]
    fn appending_stays_ordered() {
        let mut keys = vec![ZIndex::first()];
        for _ in 0..500 {
            let next = keys.last().unwrap().after();
            keys.push(next);
        }
        assert!(keys.windows(2).all(|pair| pair[0] < pair[1]));
    }
    #[test]
    fn errors() {
        assert!(matches!(
            ZIndex::between(Some(&z("a1")), Some(&z("a0"))),
            Err(ZIndexError::OutOfOrder { .. })
        ));
        assert!(matches!(
            ZIndex::between(Some(&z("a")), Some(&z("a0"))),
            Err(ZIndexError::NoRoom { .. })
        ));
        assert_eq!(ZIndex::new("a-1"), Err(ZIndexError::InvalidDigit(b'-')));
    }
    #[test]
    fn persisted_keys_are_validated() {
        assert!(serde_json::from_str::<ZIndex>("\"-1\"").is_err());
        assert!(serde_json::from_str::<ZIndex>("\"a 0\"").is_err());

        let loaded: ZIndex = serde_json::from_str("\"zz\"").unwrap();
        assert_eq!(loaded, z("zz"));
        assert!(loaded.after() > loaded);
        assert_eq!(serde_json::to_string(&loaded).unwrap(), "\"zz\"");
    }
}
