//! Compact C identifiers generated from integer indices.
//!
//! Index `i` maps to the `i`-th shortest identifier over a 63-symbol alphabet. Identifiers of
//! length `L` occupy a block of `52 * 63^(L-1)` consecutive indices: the first character is
//! always a letter, the following ones may also be `_` or a digit.
//!
//! Two index spaces are involved. A *raw* index addresses the plain bijection (`naive` and
//! `antecedent`). A *requested* index is what callers pass to `IdentAllocator`, which skips
//! the raw indices of reserved words.

use crate::errors::GenerationError;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::convert::TryFrom;
use std::fmt::{self, Display, Formatter};

/// Number of symbols allowed in the first position (letters).
const FIRST: u128 = 52;

/// Number of symbols allowed in every other position (letters, `_` and digits).
const BASE: u128 = 63;

const ALPHABET: &[u8; 63] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_1234567890";

/// C keywords. None of them may be used as an enum or type name.
pub const C_KEYWORDS: &[&str] = &[
    "do",
    "if",
    "for",
    "int",
    "auto",
    "bool",
    "case",
    "char",
    "else",
    "enum",
    "goto",
    "long",
    "true",
    "void",
    "break",
    "const",
    "false",
    "float",
    "short",
    "union",
    "while",
    "double",
    "extern",
    "inline",
    "return",
    "signed",
    "sizeof",
    "static",
    "struct",
    "switch",
    "typeof",
    "alignas",
    "alignof",
    "default",
    "nullptr",
    "typedef",
    "continue",
    "register",
    "restrict",
    "unsigned",
    "volatile",
    "constexpr",
    "thread_local",
    "static_assert",
    "typeof_unqual",
];

fn symbol(position: u128) -> char {
    ALPHABET[position as usize] as char
}

/// Position of `c` in the identifier alphabet.
pub fn position(c: char) -> Option<u8> {
    match c {
        'a'..='z' => Some(c as u8 - b'a'),
        'A'..='Z' => Some(c as u8 - b'A' + 26),
        '_' => Some(52),
        '1'..='9' => Some(c as u8 - b'1' + 53),
        '0' => Some(62),
        _ => None,
    }
}

/// Returns the identifier at raw index `raw`, ignoring reserved words.
pub fn naive(raw: u128) -> String {
    let mut length = 1;
    let mut rem = raw;
    // `weight` is 63^(length - 1), the number of distinct tails of the current length.
    let mut weight: u128 = 1;
    loop {
        let block = FIRST.saturating_mul(weight);
        if rem < block {
            break;
        }
        rem -= block;
        weight *= BASE;
        length += 1;
    }

    let mut name = String::with_capacity(length);
    name.push(symbol(rem / weight));

    let mut rest = rem % weight;
    let mut power = weight / BASE;
    while power > 0 {
        name.push(symbol(rest / power));
        rest %= power;
        power /= BASE;
    }
    name
}

/// Inverse of `naive`: the raw index whose identifier is `name`.
///
/// Returns `None` if `name` is not an identifier over the alphabet (empty, not starting with
/// a letter, containing other characters), or if its index does not fit in 128 bits.
pub fn antecedent(name: &str) -> Option<u128> {
    let mut chars = name.chars();
    let first = u128::from(position(chars.next()?)?);
    if first >= FIRST {
        return None;
    }

    // Number of identifiers shorter than `name`.
    let mut shorter: u128 = 0;
    let mut weight: u128 = 1;
    let mut tail: u128 = 0;
    for c in chars {
        let digit = u128::from(position(c)?);
        shorter = shorter.checked_add(FIRST.checked_mul(weight)?)?;
        weight = weight.checked_mul(BASE)?;
        tail = tail.checked_mul(BASE)?.checked_add(digit)?;
    }

    shorter.checked_add(first.checked_mul(weight)?)?.checked_add(tail)
}

/// A generated identifier.
///
/// Identifiers are ordered by length first, then by alphabet position of the first
/// differing character. This is the order in which they are generated, and differs from the
/// lexicographic order of `str` (`"_" > "Z"`, `"z" < "aa"`).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Ident(String);

impl Ident {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for Ident {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Ident {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for Ident {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Ident {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl Ord for Ident {
    fn cmp(&self, other: &Ident) -> Ordering {
        compare_idents(&self.0, &other.0)
    }
}

impl PartialOrd for Ident {
    fn partial_cmp(&self, other: &Ident) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compares two strings the way `Ident` values are ordered.
pub fn compare_idents(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let (a_len, b_len) = (a.chars().count(), b.chars().count());
    if a_len != b_len {
        return a_len.cmp(&b_len);
    }

    // Characters outside the alphabet sort after it.
    let key = |c: char| position(c).map_or(u32::from(c) + BASE as u32, u32::from);
    a.chars()
        .zip(b.chars())
        .find(|(x, y)| x != y)
        .map_or(Ordering::Equal, |(x, y)| key(x).cmp(&key(y)))
}

/// Maps requested indices to identifiers, skipping reserved words.
///
/// Requested index `i` always yields the `i`-th identifier (in generation order) that is not
/// reserved, whatever order indices are requested in. The ledger records every requested
/// index whose naive candidate turned out to be a reserved word, the first time that index
/// is computed.
pub struct IdentAllocator {
    reserved: HashSet<String>,

    /// Raw indices of the reserved words, sorted.
    reserved_raw: Vec<u128>,

    /// For each reserved word, the requested index at which it is the naive candidate, sorted.
    /// Consecutive reserved words share an entry value.
    collisions: Vec<u128>,

    /// Requested indices found to collide with a reserved word, sorted. Never shrinks.
    ledger: Vec<u64>,

    cache: HashMap<u64, Ident>,
}

impl IdentAllocator {
    /// Creates an allocator that never returns a C keyword.
    pub fn new() -> IdentAllocator {
        IdentAllocator::with_reserved(C_KEYWORDS.iter().copied())
    }

    /// Creates an allocator that maps requested indices straight to raw indices.
    pub fn unreserved() -> IdentAllocator {
        IdentAllocator::with_reserved(Vec::<String>::new())
    }

    pub fn with_reserved<I, S>(words: I) -> IdentAllocator
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let reserved: HashSet<String> = words.into_iter().map(Into::into).collect();
        let mut reserved_raw: Vec<u128> = reserved.iter().filter_map(|w| antecedent(w)).collect();
        reserved_raw.sort_unstable();

        // The k-th reserved word is reached once k earlier ones have been skipped.
        let collisions = reserved_raw
            .iter()
            .enumerate()
            .map(|(k, &raw)| raw - k as u128)
            .collect();

        IdentAllocator {
            reserved,
            reserved_raw,
            collisions,
            ledger: Vec::new(),
            cache: HashMap::new(),
        }
    }

    /// Returns the identifier for index `i`. Fails on negative indices without touching any
    /// allocator state.
    pub fn ident(&mut self, i: i64) -> Result<Ident, GenerationError> {
        let index = u64::try_from(i).map_err(|_| GenerationError::invalid_index(i))?;
        Ok(self.ident_at(index))
    }

    /// Infallible version of `ident` for indices that are non-negative by construction.
    pub fn ident_at(&mut self, i: u64) -> Ident {
        if let Some(ident) = self.cache.get(&i) {
            return ident.clone();
        }

        let mut candidate = naive(u128::from(i) + self.skip(i));
        if self.reserved.contains(&candidate) {
            self.record(i);
            // All reserved words colliding at `i` are skipped at once.
            candidate = naive(u128::from(i) + self.skip(i));
        }

        let ident = Ident(candidate);
        self.cache.insert(i, ident.clone());
        ident
    }

    /// Requested index at which `name` is produced, if it ever is.
    pub fn index_of(&self, name: &str) -> Option<u64> {
        if self.reserved.contains(name) {
            return None;
        }
        let raw = antecedent(name)?;
        let below = self.reserved_raw.partition_point(|&r| r < raw);
        u64::try_from(raw - below as u128).ok()
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved.contains(name)
    }

    /// Requested indices found so far to collide with a reserved word.
    pub fn ledger(&self) -> &[u64] {
        &self.ledger
    }

    /// Number of reserved words to skip for `i`. Collisions at `i` itself only count once
    /// `i` is in the ledger.
    fn skip(&self, i: u64) -> u128 {
        let index = u128::from(i);
        let skip = if self.ledger.binary_search(&i).is_ok() {
            self.collisions.partition_point(|&e| e <= index)
        } else {
            self.collisions.partition_point(|&e| e < index)
        };
        skip as u128
    }

    fn record(&mut self, i: u64) {
        if let Err(at) = self.ledger.binary_search(&i) {
            self.ledger.insert(at, i);
        }
    }
}

impl Default for IdentAllocator {
    fn default() -> IdentAllocator {
        IdentAllocator::new()
    }
}

/// Identifiers that avoid a scope of names already used in the same macro.
///
/// A macro parameter named like a macro invoked in the body would be substituted by the
/// preprocessor, so such names are skipped.
pub struct ScopedIdents {
    /// Requested indices of the scope names, sorted.
    skips: Vec<u64>,
}

impl ScopedIdents {
    pub fn new<'a, I>(allocator: &IdentAllocator, scope: I) -> ScopedIdents
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut skips: Vec<u64> = scope
            .into_iter()
            .filter_map(|name| allocator.index_of(name))
            .collect();
        skips.sort_unstable();
        skips.dedup();
        ScopedIdents { skips }
    }

    /// A scope that skips nothing.
    pub fn empty() -> ScopedIdents {
        ScopedIdents { skips: Vec::new() }
    }

    /// The `i`-th identifier outside the scope, or `None` if its index does not fit in `u64`.
    pub fn ident(&self, allocator: &mut IdentAllocator, i: u64) -> Option<Ident> {
        let mut index = i;
        for &skip in &self.skips {
            if skip > index {
                break;
            }
            index = index.checked_add(1)?;
        }
        Some(allocator.ident_at(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_identifiers_follow_the_alphabet() {
        let mut idents = IdentAllocator::new();
        assert_eq!(idents.ident(0).unwrap(), "a");
        assert_eq!(idents.ident(25).unwrap(), "z");
        assert_eq!(idents.ident(26).unwrap(), "A");
        assert_eq!(idents.ident(51).unwrap(), "Z");
        assert_eq!(idents.ident(52).unwrap(), "aa");
        assert_eq!(idents.ident(53).unwrap(), "ab");
        assert_eq!(idents.ident(52 + 52).unwrap(), "a_");
        assert_eq!(idents.ident(52 + 53).unwrap(), "a1");
        assert_eq!(idents.ident(52 + 62).unwrap(), "a0");
        assert_eq!(idents.ident(52 + 63).unwrap(), "ba");
    }

    #[test]
    fn naive_blocks() {
        assert_eq!(naive(51), "Z");
        assert_eq!(naive(52 + 52 * 63 - 1), "Z0");
        assert_eq!(naive(52 + 52 * 63), "aaa");
        assert_eq!(naive(u128::from(u64::MAX)).len(), 11);
        assert!(naive(u128::MAX).starts_with(|c: char| c.is_ascii_alphabetic()));
    }

    #[test]
    fn antecedent_inverts_naive() {
        for raw in (0..200_000).step_by(7).chain(vec![u128::from(u64::MAX), 1 << 100]) {
            assert_eq!(antecedent(&naive(raw)), Some(raw));
        }
        assert_eq!(antecedent("do"), Some(255));
        assert_eq!(antecedent("if"), Some(561));
    }

    #[test]
    fn antecedent_rejects_non_identifiers() {
        assert_eq!(antecedent(""), None);
        assert_eq!(antecedent("_a"), None);
        assert_eq!(antecedent("1a"), None);
        assert_eq!(antecedent("a-b"), None);
        assert_eq!(antecedent(&"z".repeat(40)), None);
    }

    #[test]
    fn negative_index_is_invalid() {
        let mut idents = IdentAllocator::new();
        let error = idents.ident(-1).unwrap_err();
        assert_eq!(error.code, "E0001");
        assert!(idents.ledger().is_empty());
    }

    #[test]
    fn never_returns_reserved_words_and_is_injective() {
        let mut idents = IdentAllocator::new();
        let mut seen = HashSet::new();
        let mut previous_len = 0;
        for i in 0..40_000 {
            let ident = idents.ident_at(i);
            assert!(!C_KEYWORDS.contains(&ident.as_str()), "{} is a keyword", ident);
            assert!(ident.len() >= previous_len);
            previous_len = ident.len();
            assert!(seen.insert(ident));
        }
        // "do", "if", "for" and "int" were all skipped, each at the index where it came up.
        assert_eq!(idents.ledger(), &[255, 560, 24070, 35915]);
    }

    #[test]
    fn reserved_candidate_is_skipped_once() {
        let mut idents = IdentAllocator::new();
        assert_eq!(naive(255), "do");
        assert_eq!(idents.ident_at(255), "dp");
        assert_eq!(idents.ledger(), &[255]);

        assert_eq!(idents.ident_at(255), "dp");
        assert_eq!(idents.ident_at(254), "dn");
        assert_eq!(idents.ident_at(256), "dq");
        assert_eq!(idents.ledger(), &[255]);
    }

    #[test]
    fn call_order_does_not_matter() {
        let mut ascending = IdentAllocator::new();
        let mut descending = IdentAllocator::new();
        let forward: Vec<Ident> = (0..5_000).map(|i| ascending.ident_at(i)).collect();
        let mut backward: Vec<Ident> = (0..5_000).rev().map(|i| descending.ident_at(i)).collect();
        backward.reverse();

        assert_eq!(forward, backward);
        assert_eq!(ascending.ledger(), descending.ledger());
    }

    #[test]
    fn late_request_below_a_reserved_word() {
        let mut idents = IdentAllocator::new();
        // Requesting past "do" first must not hand out its successor twice.
        let high = idents.ident_at(300);
        assert!(idents.ledger().is_empty());

        let low = idents.ident_at(255);
        assert_eq!(idents.ledger(), &[255]);
        assert_ne!(high, low);
        assert_eq!(idents.ident_at(299), naive(300).as_str());
        assert_eq!(high, naive(301).as_str());
    }

    #[test]
    fn consecutive_reserved_words_are_recorded_once() {
        let mut idents = IdentAllocator::with_reserved(vec!["b", "c"]);
        assert_eq!(idents.ident_at(1), "d");
        assert_eq!(idents.ident_at(2), "e");
        assert_eq!(idents.ident_at(0), "a");
        assert_eq!(idents.ledger(), &[1]);
    }

    #[test]
    fn unreserved_allocator_is_the_naive_mapping() {
        let mut idents = IdentAllocator::unreserved();
        assert_eq!(idents.ident_at(255), "do");
        assert!(idents.ledger().is_empty());
    }

    #[test]
    fn custom_reserved_words() {
        let mut idents = IdentAllocator::with_reserved(vec!["b", "d", "not an identifier"]);
        let got: Vec<String> = (0..4).map(|i| idents.ident_at(i).into_string()).collect();
        assert_eq!(got, vec!["a", "c", "e", "f"]);
        assert!(idents.is_reserved("b"));
        assert_eq!(idents.ledger(), &[1, 2]);
    }

    #[test]
    fn index_of_inverts_ident() {
        let mut idents = IdentAllocator::new();
        for i in (0..40_000).step_by(13) {
            let ident = idents.ident_at(i);
            assert_eq!(idents.index_of(ident.as_str()), Some(i));
        }
        assert_eq!(idents.index_of("do"), None);
        assert_eq!(idents.index_of("9lives"), None);
    }

    #[test]
    fn ordering_follows_generation_order() {
        let mut idents = IdentAllocator::new();
        let generated: Vec<Ident> = (0..10_000).map(|i| idents.ident_at(i)).collect();
        let mut sorted = generated.clone();
        sorted.sort();
        assert_eq!(generated, sorted);
    }

    #[test]
    fn ordering_compares_lengths_then_alphabet_positions() {
        assert_eq!(compare_idents("z", "aa"), Ordering::Less);
        assert_eq!(compare_idents("Z", "_"), Ordering::Less);
        assert_eq!(compare_idents("a9", "a0"), Ordering::Less);
        assert_eq!(compare_idents("", "a"), Ordering::Less);
        assert_eq!(compare_idents("abc", "abc"), Ordering::Equal);
        assert_eq!(compare_idents("ab", "aB"), Ordering::Less);
    }

    #[test]
    fn scoped_idents_skip_the_scope() {
        let mut idents = IdentAllocator::unreserved();
        let scoped = ScopedIdents::new(&idents, vec!["b", "d", "enum"]);
        let got: Vec<String> = (0..4)
            .map(|i| scoped.ident(&mut idents, i).unwrap().into_string())
            .collect();
        assert_eq!(got, vec!["a", "c", "e", "f"]);
    }

    #[test]
    fn scoped_idents_on_top_of_reserved_words() {
        let mut idents = IdentAllocator::new();
        let scoped = ScopedIdents::new(&idents, vec!["dp", "do"]);
        assert_eq!(scoped.ident(&mut idents, 254).unwrap(), "dn");
        assert_eq!(scoped.ident(&mut idents, 255).unwrap(), "dq");
    }

    #[test]
    fn scoped_index_overflow_is_reported() {
        let mut idents = IdentAllocator::unreserved();
        let scoped = ScopedIdents::new(&idents, vec!["a", "b"]);
        assert_eq!(scoped.ident(&mut idents, u64::MAX - 1), None);
        assert!(ScopedIdents::empty().ident(&mut idents, u64::MAX).is_some());
    }
}
