//! Canonical Huffman code construction, generic over the symbol type.
//!
//! The builder works in two steps. `code_lengths` derives optimal prefix-code
//! bit lengths from a frequency map with the classic priority-queue
//! construction; the tree it builds is transient and discarded once depths
//! are extracted. `canonical_code_map` then assigns the canonical codes from
//! (symbol, length) records alone, so an encoder and a decoder that agree on
//! the lengths reproduce identical bit sequences without ever exchanging the
//! tree.
//!
//! Any symbol type that is cloneable, hashable, and totally ordered works:
//! byte strings, single bytes, byte pairs, and wide signed integers all
//! share this one implementation.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::hash::Hash;

use bits_module::increment_bits;
use indexmap::IndexMap;

/// A node of the transient Huffman tree. Interior nodes own their children;
/// leaves carry a symbol.
#[derive(Debug)]
struct Node<S> {
    count: u64,
    symbol: Option<S>,
    left: Option<Box<Node<S>>>,
    right: Option<Box<Node<S>>>,
}

impl<S> PartialEq for Node<S> {
    fn eq(&self, other: &Self) -> bool {
        self.count == other.count
    }
}

impl<S> Eq for Node<S> {}

impl<S> PartialOrd for Node<S> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<S> Ord for Node<S> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.count.cmp(&other.count)
    }
}

/// A (symbol, code bit-length) record, the only thing the wire format needs
/// to carry per table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolLength<S> {
    pub symbol: S,
    pub prefix_length: u32,
}

/// Derives an optimal prefix-code bit length for every symbol in `counts`.
///
/// All counts must be positive. With a single distinct symbol the returned
/// length is zero: that symbol is coded as the empty bit sequence and
/// consumes no payload bits.
///
/// Tie-breaking between equal counts follows the heap's pop order; it is
/// stable for a given input but only the lengths are meaningful, so two
/// builders that agree on lengths agree on the canonical codes.
pub fn code_lengths<S: Clone>(counts: &IndexMap<S, u64>) -> Vec<SymbolLength<S>> {
    let mut heap = BinaryHeap::with_capacity(counts.len());
    for (symbol, &count) in counts {
        heap.push(Reverse(Box::new(Node {
            count,
            symbol: Some(symbol.clone()),
            left: None,
            right: None,
        })));
    }
    if heap.is_empty() {
        return Vec::new();
    }

    while heap.len() > 1 {
        let Reverse(first) = heap.pop().unwrap();
        let Reverse(second) = heap.pop().unwrap();
        heap.push(Reverse(Box::new(Node {
            count: first.count + second.count,
            symbol: None,
            left: Some(first),
            right: Some(second),
        })));
    }
    let Reverse(root) = heap.pop().unwrap();

    let mut lengths = Vec::with_capacity(counts.len());
    collect_lengths(&root, 0, &mut lengths);
    lengths
}

fn collect_lengths<S: Clone>(node: &Node<S>, depth: u32, out: &mut Vec<SymbolLength<S>>) {
    if let Some(symbol) = &node.symbol {
        out.push(SymbolLength {
            symbol: symbol.clone(),
            prefix_length: depth,
        });
        return;
    }
    if let Some(left) = &node.left {
        collect_lengths(left, depth + 1, out);
    }
    if let Some(right) = &node.right {
        collect_lengths(right, depth + 1, out);
    }
}

/// Assigns canonical codes to `records`.
///
/// Records are ordered by length ascending, then symbol ascending. The first
/// code is the all-zeros string of the smallest length; each successive
/// record receives the previous code plus one, left-shifted (zeros appended)
/// whenever the record's length grows. The returned map iterates in that
/// canonical order.
pub fn canonical_code_map<S>(mut records: Vec<SymbolLength<S>>) -> IndexMap<S, Vec<u8>>
where
    S: Ord + Hash + Eq + Clone,
{
    records.sort_by(|a, b| {
        a.prefix_length
            .cmp(&b.prefix_length)
            .then_with(|| a.symbol.cmp(&b.symbol))
    });

    let mut code_map = IndexMap::with_capacity(records.len());
    let mut code: Vec<u8> = Vec::new();
    for record in records {
        while (code.len() as u32) < record.prefix_length {
            code.push(0);
        }
        code_map.insert(record.symbol, code.clone());
        increment_bits(&mut code);
    }
    code_map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts_from(pairs: &[(char, u64)]) -> IndexMap<char, u64> {
        pairs.iter().copied().collect()
    }

    fn lengths_by_symbol(lengths: &[SymbolLength<char>]) -> IndexMap<char, u32> {
        lengths
            .iter()
            .map(|record| (record.symbol, record.prefix_length))
            .collect()
    }

    // Frequencies of "this is an example of a huffman tree".
    fn wikipedia_counts() -> IndexMap<char, u64> {
        counts_from(&[
            (' ', 7),
            ('a', 4),
            ('e', 4),
            ('f', 3),
            ('h', 2),
            ('i', 2),
            ('m', 2),
            ('n', 2),
            ('s', 2),
            ('t', 2),
            ('l', 1),
            ('o', 1),
            ('p', 1),
            ('r', 1),
            ('u', 1),
            ('x', 1),
        ])
    }

    #[test]
    fn optimal_lengths_for_known_distribution() {
        let lengths = lengths_by_symbol(&code_lengths(&wikipedia_counts()));

        for symbol in [' ', 'a', 'e'] {
            assert_eq!(lengths[&symbol], 3, "symbol {:?}", symbol);
        }
        for symbol in ['f', 'h', 'i', 'm', 'n', 's', 't'] {
            assert_eq!(lengths[&symbol], 4, "symbol {:?}", symbol);
        }
        for symbol in ['l', 'o', 'p', 'r', 'u', 'x'] {
            assert_eq!(lengths[&symbol], 5, "symbol {:?}", symbol);
        }
    }

    #[test]
    fn canonical_codes_preserve_lengths() {
        let lengths = code_lengths(&wikipedia_counts());
        let expected = lengths_by_symbol(&lengths);
        let codes = canonical_code_map(lengths);

        for (symbol, code) in &codes {
            assert_eq!(code.len() as u32, expected[symbol], "symbol {:?}", symbol);
        }
        // Smallest length starts at the all-zeros code; the code space is
        // completely filled, so the last code is all ones.
        assert_eq!(codes[&' '], vec![0, 0, 0]);
        assert_eq!(codes[&'x'], vec![1, 1, 1, 1, 1]);
    }

    #[test]
    fn canonical_assignment_depends_only_on_lengths() {
        let records = vec![
            SymbolLength { symbol: 'd', prefix_length: 3 },
            SymbolLength { symbol: 'a', prefix_length: 1 },
            SymbolLength { symbol: 'c', prefix_length: 3 },
            SymbolLength { symbol: 'b', prefix_length: 2 },
        ];
        let mut shuffled = records.clone();
        shuffled.reverse();

        let codes = canonical_code_map(records);
        let codes_again = canonical_code_map(shuffled);
        assert_eq!(codes, codes_again);

        assert_eq!(codes[&'a'], vec![0]);
        assert_eq!(codes[&'b'], vec![1, 0]);
        assert_eq!(codes[&'c'], vec![1, 1, 0]);
        assert_eq!(codes[&'d'], vec![1, 1, 1]);
    }

    #[test]
    fn codes_are_prefix_free() {
        let codes = canonical_code_map(code_lengths(&wikipedia_counts()));
        let all: Vec<&Vec<u8>> = codes.values().collect();
        for (i, a) in all.iter().enumerate() {
            for (j, b) in all.iter().enumerate() {
                if i != j {
                    assert!(!b.starts_with(a), "{:?} is a prefix of {:?}", a, b);
                }
            }
        }
    }

    #[test]
    fn single_symbol_gets_empty_code() {
        let counts = counts_from(&[('z', 42)]);
        let lengths = code_lengths(&counts);
        assert_eq!(lengths.len(), 1);
        assert_eq!(lengths[0].prefix_length, 0);

        let codes = canonical_code_map(lengths);
        assert_eq!(codes[&'z'], Vec::<u8>::new());
    }

    #[test]
    fn wide_integer_symbols() {
        let counts: IndexMap<i64, u64> =
            [(-5_i64, 10), (0, 7), (1_000_000, 2), (7, 2)].into_iter().collect();
        let codes = canonical_code_map(code_lengths(&counts));
        assert_eq!(codes.len(), 4);
        // Highest count gets the shortest code.
        let shortest = codes.values().map(Vec::len).min().unwrap();
        assert_eq!(codes[&-5].len(), shortest);
    }
}
