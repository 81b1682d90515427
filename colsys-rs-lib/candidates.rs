//! Enumeration of candidate grammar references.
//!
//! Pure function of the text: for every rule kind, collect the pairs of
//! intervals that *could* participate in a rule, by direct substring
//! comparison. The scan is deliberately naive (worse than cubic); a suffix
//! structure would speed it up without changing any output.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::compressor::options::Mode;

/// `(start, len)` pair; every map below is keyed by one.
pub type Interval = (usize, usize);

/// One way a truncation referrer can be derived: slice `src_len` symbols
/// starting `offset` into the string derived from `[src, src+src_len)`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TruncSource {
    pub src: usize,
    pub src_len: usize,
    pub offset: usize,
}

/// All candidate `(definer, referenced)` pairs for a text, indexed both ways.
#[derive(Debug, Default)]
pub struct Candidates {
    pub n: usize,
    /// Concat rules: `(src, len)` -> starts of referrer occurrences.
    pub concat_by_src: FxHashMap<Interval, Vec<usize>>,
    /// Concat rules: `(dst, len)` -> starts of source occurrences.
    pub concat_by_dst: FxHashMap<Interval, Vec<usize>>,
    /// Run-length rules: referrer `(dst, len)` -> unit starts.
    pub rl_by_dst: FxHashMap<Interval, Vec<usize>>,
    /// Run-length rules: whole span `(src, unit_len + len)` -> referrer starts.
    pub rl_whole: FxHashMap<Interval, Vec<usize>>,
    /// Run-length rules: unit `(src, unit_len)` -> referrer lengths.
    pub rl_unit: FxHashMap<Interval, Vec<usize>>,
    /// Truncation rules: referrer `(dst, dst_len)` -> candidate sources.
    pub trunc_by_dst: FxHashMap<Interval, Vec<TruncSource>>,
    /// Truncation rules: source `(src, src_len)` -> referrer intervals.
    pub trunc_by_src: FxHashMap<Interval, Vec<Interval>>,
}

impl Candidates {
    /// Scan `text` for all reference candidates admissible under `mode`.
    #[must_use]
    pub fn scan(text: &[u8], mode: Mode) -> Self {
        let n = text.len();
        let mut cand = Candidates {
            n,
            ..Candidates::default()
        };

        cand.scan_concat(text);
        if mode.runs_enabled() {
            cand.scan_run_length(text);
        }
        if mode.cuts_enabled() {
            cand.scan_truncation(text);
        }
        cand
    }

    /// Equal, non-overlapping occurrences: the later one may copy the earlier.
    fn scan_concat(&mut self, text: &[u8]) {
        let n = self.n;
        for src in 0..n {
            for dst in src + 1..n {
                for len in 2..=n.saturating_sub(dst) {
                    if src + len <= dst && text[src..src + len] == text[dst..dst + len] {
                        self.concat_by_src.entry((src, len)).or_default().push(dst);
                        self.concat_by_dst.entry((dst, len)).or_default().push(src);
                    }
                }
            }
        }
    }

    /// Equal occurrences overlapping at distance `p`, with `p` dividing the
    /// referrer length: the text is periodic on `[src, dst+len)` and the
    /// referrer extends the run of units `[src, dst)`.
    fn scan_run_length(&mut self, text: &[u8]) {
        let n = self.n;
        for src in 0..n {
            for dst in src + 1..n {
                for len in 2..=n.saturating_sub(dst) {
                    let unit = dst - src;
                    if dst < src + len
                        && len % unit == 0
                        && text[src..src + len] == text[dst..dst + len]
                    {
                        self.rl_by_dst.entry((dst, len)).or_default().push(src);
                        self.rl_whole
                            .entry((src, len + unit))
                            .or_default()
                            .push(dst);
                        self.rl_unit.entry((src, unit)).or_default().push(len);
                    }
                }
            }
        }
    }

    /// Equal, disjoint occurrences where the opposite occurrence sits inside
    /// a strictly longer interval that still does not touch the referrer:
    /// the referrer can be cut out of that interval at a recorded offset.
    fn scan_truncation(&mut self, text: &[u8]) {
        let n = self.n;
        let mut seen: FxHashSet<(Interval, Interval)> = FxHashSet::default();
        for l1 in 2..n {
            for a in 0..=n - l1 {
                for b in a + l1..=n.saturating_sub(l1) {
                    if text[a..a + l1] != text[b..b + l1] {
                        continue;
                    }
                    // Referrer at `a`, source interval enclosing the copy at `b`.
                    for sl in a + l1..=b {
                        for sr in b + l1..=n {
                            self.push_trunc(&mut seen, (a, l1), sl, sr - sl, b - sl);
                        }
                    }
                    // Referrer at `b`, source interval enclosing the copy at `a`.
                    for sl in 0..=a {
                        for sr in a + l1..=b {
                            self.push_trunc(&mut seen, (b, l1), sl, sr - sl, a - sl);
                        }
                    }
                }
            }
        }
    }

    fn push_trunc(
        &mut self,
        seen: &mut FxHashSet<(Interval, Interval)>,
        dst: Interval,
        src: usize,
        src_len: usize,
        offset: usize,
    ) {
        // A source of equal length is just a concat rule; the first offset
        // found for a (referrer, source) pair wins.
        if src_len <= dst.1 || !seen.insert((dst, (src, src_len))) {
            return;
        }
        self.trunc_by_dst.entry(dst).or_default().push(TruncSource {
            src,
            src_len,
            offset,
        });
        self.trunc_by_src
            .entry((src, src_len))
            .or_default()
            .push(dst);
    }

    /// Union of every interval some rule may reference, sorted.
    #[must_use]
    pub fn referenced_intervals(&self) -> Vec<Interval> {
        let mut set: FxHashSet<Interval> = FxHashSet::default();
        set.extend(self.concat_by_src.keys());
        set.extend(self.rl_whole.keys());
        set.extend(self.rl_unit.keys());
        set.extend(self.trunc_by_src.keys());
        let mut out: Vec<_> = set.into_iter().collect();
        out.sort_unstable();
        out
    }

    /// Union of every interval that could be a defining (referrer) phrase of
    /// length >= 2, sorted.
    #[must_use]
    pub fn referrer_intervals(&self) -> Vec<Interval> {
        let mut set: FxHashSet<Interval> = FxHashSet::default();
        set.extend(self.concat_by_dst.keys());
        set.extend(self.rl_by_dst.keys());
        set.extend(self.trunc_by_dst.keys());
        let mut out: Vec<_> = set.into_iter().collect();
        out.sort_unstable();
        out
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::Candidates;
    use crate::compressor::options::Mode;

    #[test]
    fn concat_pairs_abab() {
        let cand = Candidates::scan(b"abab", Mode::Slp);
        assert_eq!(cand.concat_by_src.get(&(0, 2)), Some(&vec![2]));
        assert_eq!(cand.concat_by_dst.get(&(2, 2)), Some(&vec![0]));
        assert!(cand.rl_by_dst.is_empty());
        assert!(cand.trunc_by_dst.is_empty());
    }

    #[test]
    fn run_pairs_aaaa() {
        let cand = Candidates::scan(b"aaaa", Mode::Rlslp);
        // Unit [0,1), referrer [1,4): the whole text as a run of four units.
        assert_eq!(cand.rl_by_dst.get(&(1, 3)), Some(&vec![0]));
        assert!(cand.rl_whole.contains_key(&(0, 4)));
        assert!(cand.rl_unit.contains_key(&(0, 1)));
    }

    #[test]
    fn truncation_sources_are_strictly_longer_and_disjoint() {
        let cand = Candidates::scan(b"abcxabcy", Mode::Collage);
        let sources = cand.trunc_by_dst.get(&(0, 3)).expect("abc at 0 has cuts");
        for s in sources {
            assert!(s.src_len > 3);
            assert!(s.src >= 3, "source {s:?} overlaps the referrer");
            // The recorded offset points at an equal copy.
            let slice = &b"abcxabcy"[s.src + s.offset..s.src + s.offset + 3];
            assert_eq!(slice, b"abc");
        }
    }

    #[test]
    fn slp_mode_suppresses_runs_and_cuts() {
        let cand = Candidates::scan(b"aaaaaa", Mode::Slp);
        assert!(cand.rl_by_dst.is_empty());
        assert!(cand.trunc_by_dst.is_empty());
        assert!(!cand.concat_by_dst.is_empty());
    }
}
