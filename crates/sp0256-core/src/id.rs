//! Allophone identity and the SP0256-AL2 catalogue
//!
//! The chip addresses 64 allophones with a 6-bit bus. Ids 0-4 are the
//! pauses PA1..PA5; everything above is a speech sound.

use std::fmt;
use std::str::FromStr;

use crate::{Sp0256Error, Sp0256Result};

/// Allophone id - always in 0..=63
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AllophoneId(u8);

/// Pinned pause ids, never evicted from the cache
pub const PINNED_PAUSES: [AllophoneId; 5] = [
    AllophoneId(0),
    AllophoneId(1),
    AllophoneId(2),
    AllophoneId(3),
    AllophoneId(4),
];

impl AllophoneId {
    pub const MAX: u8 = 63;
    pub const COUNT: usize = 64;

    pub const PA1: AllophoneId = AllophoneId(0);
    pub const PA2: AllophoneId = AllophoneId(1);
    pub const PA5: AllophoneId = AllophoneId(4);

    /// Validate a raw id
    pub fn new(raw: u32) -> Sp0256Result<Self> {
        if raw <= Self::MAX as u32 {
            Ok(AllophoneId(raw as u8))
        } else {
            Err(Sp0256Error::InvalidId(raw))
        }
    }

    /// Build an id from the parallel address bus; upper bits are ignored
    #[inline]
    pub fn from_address(bits: u8) -> Self {
        AllophoneId(bits & 0x3F)
    }

    #[inline]
    pub fn value(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// PA1..PA5
    #[inline]
    pub fn is_pause(self) -> bool {
        self.0 < 5
    }

    /// Canonical mnemonic (PA1, OY, ...)
    pub fn mnemonic(self) -> &'static str {
        CATALOGUE[self.index()].0
    }

    /// Example word from the datasheet table
    pub fn example(self) -> &'static str {
        CATALOGUE[self.index()].1
    }

    /// Iterate all 64 ids in ascending order
    pub fn all() -> impl Iterator<Item = AllophoneId> {
        (0..=Self::MAX).map(AllophoneId)
    }
}

impl TryFrom<u8> for AllophoneId {
    type Error = Sp0256Error;

    fn try_from(raw: u8) -> Sp0256Result<Self> {
        AllophoneId::new(raw as u32)
    }
}

impl TryFrom<u32> for AllophoneId {
    type Error = Sp0256Error;

    fn try_from(raw: u32) -> Sp0256Result<Self> {
        AllophoneId::new(raw)
    }
}

impl From<AllophoneId> for u8 {
    fn from(id: AllophoneId) -> u8 {
        id.0
    }
}

impl fmt::Debug for AllophoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Allophone({}:{})", self.0, self.mnemonic())
    }
}

impl fmt::Display for AllophoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}

impl FromStr for AllophoneId {
    type Err = Sp0256Error;

    fn from_str(s: &str) -> Sp0256Result<Self> {
        resolve(s)
    }
}

/// Mnemonic and example word, indexed by id
const CATALOGUE: [(&str, &str); AllophoneId::COUNT] = [
    ("PA1", "10ms pause"),
    ("PA2", "30ms pause"),
    ("PA3", "50ms pause"),
    ("PA4", "100ms pause"),
    ("PA5", "200ms pause"),
    ("OY", "Boy"),
    ("AY", "Sky"),
    ("EH", "End"),
    ("KK3", "Comb"),
    ("PP", "Pow"),
    ("JH", "Dodge"),
    ("NN1", "Thin"),
    ("IH", "Sit"),
    ("TT2", "To"),
    ("RR1", "Rural"),
    ("AX", "Succeed"),
    ("MM", "Milk"),
    ("TT1", "Part"),
    ("DH1", "They"),
    ("IY", "See"),
    ("EY", "Beige"),
    ("DD1", "Could"),
    ("UW1", "To"),
    ("AO", "Aught"),
    ("AA", "Hot"),
    ("YY2", "Yes"),
    ("AE", "Hat"),
    ("HH1", "He"),
    ("BB1", "Business"),
    ("TH", "Thin"),
    ("UH", "Book"),
    ("UW2", "Food"),
    ("AW", "Out"),
    ("DD2", "Do"),
    ("GG3", "Wig"),
    ("VV", "Vest"),
    ("GG1", "Got"),
    ("SH", "Ship"),
    ("ZH", "Azure"),
    ("RR2", "Brain"),
    ("FF", "Food"),
    ("KK2", "Sky"),
    ("KK1", "Can't"),
    ("ZZ", "Zoo"),
    ("NG", "Anchor"),
    ("LL", "Lake"),
    ("WW", "Wool"),
    ("XR", "Repair"),
    ("WH", "Whig"),
    ("YY1", "Yes"),
    ("CH", "Church"),
    ("ER1", "Fir"),
    ("ER2", "Fir"),
    ("OW", "Beau"),
    ("DH2", "They"),
    ("SS", "Vest"),
    ("NN2", "No"),
    ("HH2", "Hoe"),
    ("OR", "Store"),
    ("AR", "Alarm"),
    ("YR", "Clear"),
    ("GG2", "Guest"),
    ("EL", "Saddle"),
    ("BB2", "Business"),
];

/// Short names accepted in place of the numbered variants
const ALIASES: [(&str, u8); 11] = [
    ("NN", 11),
    ("RR", 14),
    ("TT", 17),
    ("DH", 18),
    ("DD", 21),
    ("UW", 22),
    ("GG", 36),
    ("HH", 27),
    ("KK", 42),
    ("YY", 49),
    ("ER", 51),
];

/// Resolve a console token (decimal id or mnemonic) to an id
///
/// Numbers must be in 0..=63. Names are case-insensitive and may use
/// the short aliases (HH, NN, ...).
pub fn resolve(token: &str) -> Sp0256Result<AllophoneId> {
    let token = token.trim();
    if token.is_empty() {
        return Err(Sp0256Error::InvalidToken(token.to_string()));
    }

    if token.bytes().all(|b| b.is_ascii_digit()) {
        return token
            .parse::<u32>()
            .ok()
            .and_then(|raw| AllophoneId::new(raw).ok())
            .ok_or_else(|| Sp0256Error::InvalidToken(token.to_string()));
    }

    let upper = token.to_ascii_uppercase();
    if let Some(pos) = CATALOGUE.iter().position(|(name, _)| *name == upper) {
        return Ok(AllophoneId(pos as u8));
    }
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == upper)
        .map(|(_, id)| AllophoneId(*id))
        .ok_or_else(|| Sp0256Error::InvalidToken(token.to_string()))
}

/// Resolve every token of a sequence, failing on the first bad one
pub fn resolve_all<'a, I>(tokens: I) -> Sp0256Result<Vec<AllophoneId>>
where
    I: IntoIterator<Item = &'a str>,
{
    tokens.into_iter().map(resolve).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_id_bounds() {
        assert!(AllophoneId::new(0).is_ok());
        assert!(AllophoneId::new(63).is_ok());
        assert!(matches!(
            AllophoneId::new(64),
            Err(Sp0256Error::InvalidId(64))
        ));
        assert!(AllophoneId::try_from(200u8).is_err());
    }

    #[test]
    fn test_from_address_masks() {
        assert_eq!(AllophoneId::from_address(0xFF).value(), 63);
        assert_eq!(AllophoneId::from_address(0x40).value(), 0);
        assert_eq!(AllophoneId::from_address(27).mnemonic(), "HH1");
    }

    #[test]
    fn test_pauses() {
        for id in PINNED_PAUSES {
            assert!(id.is_pause());
        }
        assert!(!AllophoneId::from_address(5).is_pause());
        assert_eq!(AllophoneId::PA5.example(), "200ms pause");
    }

    #[test]
    fn test_resolve_names_and_numbers() {
        assert_eq!(resolve("27").unwrap().value(), 27);
        assert_eq!(resolve("hh").unwrap().value(), 27);
        assert_eq!(resolve(" HH1 ").unwrap().value(), 27);
        assert_eq!(resolve("pa1").unwrap().value(), 0);
        assert_eq!(resolve("BB2").unwrap().value(), 63);
        assert_eq!(resolve("ER").unwrap().value(), 51);
        assert_eq!("OW".parse::<AllophoneId>().unwrap().value(), 53);
    }

    #[test]
    fn test_resolve_rejects() {
        assert!(resolve("64").is_err());
        assert!(resolve("-1").is_err());
        assert!(resolve("").is_err());
        assert!(resolve("QQ").is_err());
        assert!(resolve("99999999999999").is_err());
    }

    #[test]
    fn test_resolve_all_stops_on_error() {
        let ok = resolve_all(["HH", "EH", "LL", "OW"]).unwrap();
        assert_eq!(
            ok.iter().map(|id| id.value()).collect::<Vec<_>>(),
            vec![27, 7, 45, 53]
        );
        assert!(resolve_all(["HH", "nope", "OW"]).is_err());
    }

    #[test]
    fn test_mnemonics_unique() {
        let mut names: Vec<_> = AllophoneId::all().map(|id| id.mnemonic()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), AllophoneId::COUNT);
    }

    proptest! {
        #[test]
        fn prop_mnemonic_resolves_back(raw in 0u8..=63) {
            let id = AllophoneId::try_from(raw).unwrap();
            prop_assert_eq!(resolve(id.mnemonic()).unwrap(), id);
            prop_assert_eq!(resolve(&raw.to_string()).unwrap(), id);
        }
    }
}
