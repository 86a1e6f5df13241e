//! Combination of equivalence classes across parameters.
//!
//! Small signatures get the full cross product. Wider ones get a
//! deterministic IPOG construction: parameters are added one at a time,
//! first extending existing rows greedily (horizontal growth), then adding
//! rows for pairs still uncovered (vertical growth). IPOG is loose, so when
//! its set is larger than the ceiling the first `ceiling` rows are kept and
//! repaired: an uncovered pair is written into whichever row loses the
//! fewest other pairs by taking it, until every pair is covered again or
//! the step budget runs out.

use mdtd_core::types::collections::FxHashSet;

/// Parameters up to which the full product is taken when it fits.
pub const FULL_PRODUCT_MAX_PARAMS: usize = 4;

/// Repair steps tried before the remaining pairs are given up on.
const REPAIR_BUDGET: usize = 20_000;
const REPAIR_SEED: u64 = 0x2545_F491_4F6C_DD1D;

/// Rows of class indices, one index per parameter.
pub type Combination = Vec<usize>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Combinations {
    pub rows: Vec<Combination>,
    /// Value pairs of two parameters that no row covers. Nonzero only when
    /// no covering set fits the ceiling.
    pub uncovered: usize,
    pub pairwise: bool,
}

/// Combine `sizes[i]` classes of parameter `i` under `ceiling` rows.
pub fn combine(sizes: &[usize], ceiling: usize) -> Combinations {
    if sizes.iter().any(|&s| s == 0) {
        return Combinations {
            rows: Vec::new(),
            uncovered: 0,
            pairwise: false,
        };
    }
    let product = sizes.iter().try_fold(1usize, |acc, &s| acc.checked_mul(s));
    let fits = product.is_some_and(|p| p <= ceiling);
    if sizes.len() <= FULL_PRODUCT_MAX_PARAMS && fits {
        return Combinations {
            rows: cross_product(sizes),
            uncovered: 0,
            pairwise: false,
        };
    }
    let rows = ipog(sizes);
    if rows.len() <= ceiling {
        return Combinations {
            rows,
            uncovered: 0,
            pairwise: true,
        };
    }
    let (rows, uncovered) = repair(sizes, rows, ceiling);
    Combinations {
        rows,
        uncovered,
        pairwise: true,
    }
}

pub fn cross_product(sizes: &[usize]) -> Vec<Combination> {
    let mut rows: Vec<Combination> = vec![Vec::new()];
    for &size in sizes {
        let mut next = Vec::with_capacity(rows.len() * size);
        for row in &rows {
            for v in 0..size {
                let mut r = row.clone();
                r.push(v);
                next.push(r);
            }
        }
        rows = next;
    }
    rows
}

pub fn ipog(sizes: &[usize]) -> Vec<Combination> {
    if sizes.len() < 2 {
        return cross_product(sizes);
    }
    let mut rows: Vec<Vec<Option<usize>>> = cross_product(&sizes[..2])
        .into_iter()
        .map(|r| r.into_iter().map(Some).collect())
        .collect();

    for (k, &size) in sizes.iter().enumerate().skip(2) {
        // Pairs (earlier parameter, its value, value of k) still uncovered.
        let mut uncovered: FxHashSet<(usize, usize, usize)> = FxHashSet::default();
        for (j, &sj) in sizes[..k].iter().enumerate() {
            for a in 0..sj {
                for b in 0..size {
                    uncovered.insert((j, a, b));
                }
            }
        }

        // Horizontal growth.
        for row in rows.iter_mut() {
            let best = (0..size)
                .max_by_key(|&v| {
                    let gain = covered_by(row, v, &uncovered);
                    // Prefer the smaller value on ties.
                    (gain, std::cmp::Reverse(v))
                })
                .unwrap_or(0);
            row.push(Some(best));
            mark_covered(row, k, &mut uncovered);
        }

        // Vertical growth.
        let mut pending: Vec<(usize, usize, usize)> = uncovered.into_iter().collect();
        pending.sort_unstable();
        let first_new = rows.len();
        for (j, a, b) in pending {
            let slot = rows[first_new..]
                .iter()
                .position(|r| r[k] == Some(b) && (r[j].is_none() || r[j] == Some(a)));
            match slot {
                Some(i) => rows[first_new + i][j] = Some(a),
                None => {
                    let mut row = vec![None; k + 1];
                    row[j] = Some(a);
                    row[k] = Some(b);
                    rows.push(row);
                }
            }
        }
    }

    rows.into_iter()
        .map(|r| r.into_iter().map(|v| v.unwrap_or(0)).collect())
        .collect()
}

fn covered_by(row: &[Option<usize>], value: usize, uncovered: &FxHashSet<(usize, usize, usize)>) -> usize {
    row.iter()
        .enumerate()
        .filter(|(j, a)| a.is_some_and(|a| uncovered.contains(&(*j, a, value))))
        .count()
}

fn mark_covered(row: &[Option<usize>], k: usize, uncovered: &mut FxHashSet<(usize, usize, usize)>) {
    let Some(b) = row[k] else {
        return;
    };
    for (j, a) in row[..k].iter().enumerate() {
        if let Some(a) = a {
            uncovered.remove(&(j, *a, b));
        }
    }
}

/// Keep the first `target` rows and rewrite cells until every pair is
/// covered or the budget is spent. Returns the rows and the pairs left open.
fn repair(sizes: &[usize], rows: Vec<Combination>, target: usize) -> (Vec<Combination>, usize) {
    let index = PairIndex::new(sizes);
    let mut rows: Vec<Combination> = rows.into_iter().take(target).collect();
    let mut counts = vec![0u32; index.pairs.len()];
    for row in &rows {
        for p in 0..sizes.len() {
            for q in p + 1..sizes.len() {
                counts[index.of(p, row[p], q, row[q])] += 1;
            }
        }
    }
    let mut cover = Coverage {
        open: OpenPairs::new(&counts),
        counts,
        index: &index,
    };
    let mut rng = Xorshift64::new(REPAIR_SEED);

    for _ in 0..REPAIR_BUDGET {
        if cover.open.is_empty() {
            break;
        }
        let pick = cover.open.items[rng.below(cover.open.len())];
        let (p, a, q, b) = index.pairs[pick];

        let mut best = 0;
        let mut best_delta: Option<i64> = None;
        for (i, row) in rows.iter_mut().enumerate() {
            let old = row[p];
            let mut delta = cover.delta(row, p, a);
            cover.set(row, p, a);
            delta += cover.delta(row, q, b);
            cover.set(row, p, old);
            let better = match best_delta {
                None => true,
                Some(d) => delta < d || (delta == d && rng.below(2) == 0),
            };
            if better {
                best = i;
                best_delta = Some(delta);
            }
        }
        cover.set(&mut rows[best], p, a);
        cover.set(&mut rows[best], q, b);
    }
    let open = cover.open.len();
    (rows, open)
}

/// Flat numbering of every (column, value, column, value) pair.
struct PairIndex {
    sizes: Vec<usize>,
    /// Start of the block for columns `p < q`, at `p * n + q`.
    offsets: Vec<usize>,
    pairs: Vec<(usize, usize, usize, usize)>,
}

impl PairIndex {
    fn new(sizes: &[usize]) -> Self {
        let n = sizes.len();
        let mut offsets = vec![0; n * n];
        let mut pairs = Vec::new();
        for p in 0..n {
            for q in p + 1..n {
                offsets[p * n + q] = pairs.len();
                for a in 0..sizes[p] {
                    for b in 0..sizes[q] {
                        pairs.push((p, a, q, b));
                    }
                }
            }
        }
        Self {
            sizes: sizes.to_vec(),
            offsets,
            pairs,
        }
    }

    fn of(&self, p: usize, a: usize, q: usize, b: usize) -> usize {
        if p > q {
            return self.of(q, b, p, a);
        }
        self.offsets[p * self.sizes.len() + q] + a * self.sizes[q] + b
    }
}

/// Uncovered pair indices with O(1) insert, remove and random pick.
struct OpenPairs {
    items: Vec<usize>,
    slots: Vec<Option<usize>>,
}

impl OpenPairs {
    fn new(counts: &[u32]) -> Self {
        let mut slots = vec![None; counts.len()];
        let mut items = Vec::new();
        for (pair, &count) in counts.iter().enumerate() {
            if count == 0 {
                slots[pair] = Some(items.len());
                items.push(pair);
            }
        }
        Self { items, slots }
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn insert(&mut self, pair: usize) {
        self.slots[pair] = Some(self.items.len());
        self.items.push(pair);
    }

    fn remove(&mut self, pair: usize) {
        let Some(slot) = self.slots[pair].take() else {
            return;
        };
        if let Some(last) = self.items.pop() {
            if last != pair {
                self.items[slot] = last;
                self.slots[last] = Some(slot);
            }
        }
    }
}

struct Coverage<'a> {
    index: &'a PairIndex,
    counts: Vec<u32>,
    open: OpenPairs,
}

impl Coverage<'_> {
    /// Change in open pairs if `row[column]` became `value`.
    fn delta(&self, row: &[usize], column: usize, value: usize) -> i64 {
        let old = row[column];
        if old == value {
            return 0;
        }
        let mut delta = 0;
        for (q, &other) in row.iter().enumerate() {
            if q == column {
                continue;
            }
            if self.counts[self.index.of(column, old, q, other)] == 1 {
                delta += 1;
            }
            if self.counts[self.index.of(column, value, q, other)] == 0 {
                delta -= 1;
            }
        }
        delta
    }

    fn set(&mut self, row: &mut [usize], column: usize, value: usize) {
        let old = row[column];
        if old == value {
            return;
        }
        for q in 0..row.len() {
            if q == column {
                continue;
            }
            let other = row[q];
            let lost = self.index.of(column, old, q, other);
            self.counts[lost] -= 1;
            if self.counts[lost] == 0 {
                self.open.insert(lost);
            }
            let gained = self.index.of(column, value, q, other);
            self.counts[gained] += 1;
            if self.counts[gained] == 1 {
                self.open.remove(gained);
            }
        }
        row[column] = value;
    }
}

/// Deterministic xorshift64, so the same signature always repairs the same way.
struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next_u64(&mut self) -> u64 {
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    fn below(&mut self, bound: usize) -> usize {
        (self.next_u64() % bound as u64) as usize
    }
}

/// True when every value pair of two distinct parameters appears in a row.
pub fn covers_all_pairs(sizes: &[usize], rows: &[Combination]) -> bool {
    for i in 0..sizes.len() {
        for j in i + 1..sizes.len() {
            for a in 0..sizes[i] {
                for b in 0..sizes[j] {
                    if !rows.iter().any(|r| r[i] == a && r[j] == b) {
                        return false;
                    }
                }
            }
        }
    }
    true
}
