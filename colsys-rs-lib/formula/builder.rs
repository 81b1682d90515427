//! Translation of a scanned text into the weighted CNF whose optimal models
//! are minimum parses.
//!
//! The encoding follows the phrase/boundary scheme: `pstart(i)` marks phrase
//! boundaries, `phrase(i,l)` holds for the maximal gaps between consecutive
//! boundaries, and every phrase of length two or more must be defined by
//! exactly one reference into the rest of the text. Interior boundaries and
//! active cuts are the soft, unit-weight objective.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::candidates::{Candidates, Interval};
use crate::compressor::options::CompressorOptions;
use crate::formula::card;
use crate::formula::cnf::{self, Clause, Wcnf};
use crate::literal::{LitKey, LiteralManager, VarId};
use crate::Result;

/// Everything the solving stage needs: the formula, the variable registry
/// used to decode models, and the candidate tables used to rebuild rules.
#[derive(Debug)]
pub struct BuiltFormula {
    pub literals: LiteralManager,
    pub wcnf: Wcnf,
    pub candidates: Candidates,
}

/// Build the weighted CNF for `text` under the rule set of `options.mode`.
///
/// Callers handle texts shorter than two symbols themselves; the encoding is
/// still well formed for them but degenerate.
#[tracing::instrument(skip_all, fields(n = text.len(), mode = %options.mode))]
pub fn build(text: &[u8], options: &CompressorOptions) -> Result<BuiltFormula> {
    let n = text.len();
    let candidates = Candidates::scan(text, options.mode);
    let mut lm = LiteralManager::new(n);
    let mut wcnf = Wcnf::new();

    // Boundary variables; the outer two are fixed.
    let mut pstart: Vec<VarId> = Vec::with_capacity(n + 1);
    for i in 0..=n {
        pstart.push(lm.get_or_create(LitKey::PhraseStart { i })?);
    }
    wcnf.add_hard_unit(pstart[0].lit());
    if n > 0 {
        wcnf.add_hard_unit(pstart[n].lit());
    }

    let referrer_list = candidates.referrer_intervals();
    let referrers: FxHashSet<Interval> = referrer_list.iter().copied().collect();

    // A phrase holds iff its boundary pattern does, and phrases of length
    // two or more without any candidate reference are forbidden outright.
    for i in 0..n {
        for l in 1..=n - i {
            let phrase = lm.get_or_create(LitKey::Phrase { i, l })?;
            let mut pattern: Vec<i32> = vec![pstart[i].lit(), pstart[i + l].lit()];
            pattern.extend((i + 1..i + l).map(|p| pstart[p].nlit()));
            let (gap, def) = cnf::and_defined(&pattern, &mut lm);
            wcnf.extend_hard(def);
            wcnf.extend_hard(cnf::iff(phrase.lit(), gap));
            if l >= 2 && !referrers.contains(&(i, l)) {
                wcnf.add_hard_unit(phrase.nlit());
            }
        }
    }

    // Each defining phrase holds iff it picks a reference, and at most one.
    for &(dst, len) in &referrer_list {
        let mut choices: Vec<i32> = Vec::new();
        if let Some(srcs) = candidates.concat_by_dst.get(&(dst, len)) {
            for &src in srcs {
                choices.push(lm.get_or_create(LitKey::ConcatRef { src, dst, len })?.lit());
            }
        }
        if let Some(srcs) = candidates.rl_by_dst.get(&(dst, len)) {
            for &src in srcs {
                choices.push(lm.get_or_create(LitKey::RunLenRef { src, dst, len })?.lit());
            }
        }
        if let Some(sources) = candidates.trunc_by_dst.get(&(dst, len)) {
            for s in sources {
                let key = LitKey::TruncRef {
                    src: s.src,
                    src_len: s.src_len,
                    dst,
                    dst_len: len,
                };
                choices.push(lm.get_or_create(key)?.lit());
            }
        }
        wcnf.extend_hard(card::at_most_one(&choices));
        let (any, def) = cnf::or_defined(&choices, &mut lm);
        wcnf.extend_hard(def);
        let phrase = lm.get_or_create(LitKey::Phrase { i: dst, l: len })?;
        wcnf.extend_hard(cnf::iff(phrase.lit(), any));
    }

    // Intervals used as a concat target or cut source must be split phrases:
    // boundaries at both ends plus at least one interior boundary.
    let mut split_keys: Vec<Interval> = candidates
        .concat_by_src
        .keys()
        .chain(candidates.trunc_by_src.keys())
        .copied()
        .collect::<FxHashSet<_>>()
        .into_iter()
        .collect();
    split_keys.sort_unstable();

    let mut split_used: FxHashMap<Interval, i32> = FxHashMap::default();
    for &(src, len) in &split_keys {
        let mut incoming: Vec<i32> = Vec::new();
        if let Some(dsts) = candidates.concat_by_src.get(&(src, len)) {
            for &dst in dsts {
                incoming.push(lm.get_or_create(LitKey::ConcatRef { src, dst, len })?.lit());
            }
        }
        if let Some(dsts) = candidates.trunc_by_src.get(&(src, len)) {
            for &(dst, dst_len) in dsts {
                let key = LitKey::TruncRef {
                    src,
                    src_len: len,
                    dst,
                    dst_len,
                };
                incoming.push(lm.get_or_create(key)?.lit());
            }
        }
        let (used, def) = cnf::or_defined(&incoming, &mut lm);
        wcnf.extend_hard(def);
        wcnf.add_hard(cnf::implies(used, pstart[src].lit()));
        wcnf.add_hard(cnf::implies(used, pstart[src + len].lit()));
        let mut interior: Clause = vec![-used];
        interior.extend((src + 1..src + len).map(|p| pstart[p].lit()));
        wcnf.add_hard(interior);
        split_used.insert((src, len), used);
    }

    // An active run-length reference pins the unit's left boundary; the
    // right boundary is the referrer's start, already a phrase edge.
    for &(dst, len) in &referrer_list {
        if let Some(srcs) = candidates.rl_by_dst.get(&(dst, len)) {
            for &src in srcs {
                let rl = lm.get_or_create(LitKey::RunLenRef { src, dst, len })?;
                wcnf.add_hard(cnf::implies(rl.lit(), pstart[src].lit()));
            }
        }
    }

    // An interval is referenced iff some rule uses it, in any role.
    let referenced_list = candidates.referenced_intervals();
    for &(i, l) in &referenced_list {
        let mut ways: Vec<i32> = Vec::new();
        if let Some(&used) = split_used.get(&(i, l)) {
            ways.push(used);
        }
        if let Some(dsts) = candidates.rl_whole.get(&(i, l)) {
            for &dst in dsts {
                let len = l - (dst - i);
                ways.push(lm.get_or_create(LitKey::RunLenRef { src: i, dst, len })?.lit());
            }
        }
        if let Some(lens) = candidates.rl_unit.get(&(i, l)) {
            for &len in lens {
                let key = LitKey::RunLenRef {
                    src: i,
                    dst: i + l,
                    len,
                };
                ways.push(lm.get_or_create(key)?.lit());
            }
        }
        let (any, def) = cnf::or_defined(&ways, &mut lm);
        wcnf.extend_hard(def);
        let referenced = lm.get_or_create(LitKey::Referenced { i, l })?;
        wcnf.extend_hard(cnf::iff(referenced.lit(), any));
    }

    // Two referenced intervals may not properly cross.
    let mut lens_at: Vec<Vec<usize>> = vec![Vec::new(); n + 1];
    for &(i, l) in &referenced_list {
        lens_at[i].push(l);
    }
    for &(i1, l1) in &referenced_list {
        if l1 < 2 {
            continue;
        }
        for i2 in i1 + 1..i1 + l1 {
            for &l2 in &lens_at[i2] {
                if l2 >= 2 && i2 + l2 > i1 + l1 {
                    let a = lm.get_or_create(LitKey::Referenced { i: i1, l: l1 })?;
                    let b = lm.get_or_create(LitKey::Referenced { i: i2, l: l2 })?;
                    wcnf.add_hard(vec![a.nlit(), b.nlit()]);
                }
            }
        }
    }

    if options.mode.cuts_enabled() && !candidates.trunc_by_dst.is_empty() {
        emit_depth_constraints(&candidates, &mut lm, &mut wcnf, n)?;
    }

    // Objective: each interior boundary and each active cut costs one.
    for i in 1..n {
        wcnf.add_soft(pstart[i].lit(), options.soft_weight);
    }
    let mut cut_dsts: Vec<Interval> = candidates.trunc_by_dst.keys().copied().collect();
    cut_dsts.sort_unstable();
    for (dst, dst_len) in cut_dsts {
        if let Some(sources) = candidates.trunc_by_dst.get(&(dst, dst_len)) {
            for s in sources {
                let key = LitKey::TruncRef {
                    src: s.src,
                    src_len: s.src_len,
                    dst,
                    dst_len,
                };
                wcnf.add_soft(lm.get_or_create(key)?.lit(), options.soft_weight);
            }
        }
    }

    Ok(BuiltFormula {
        literals: lm,
        wcnf,
        candidates,
    })
}

/// Stratify the derivation by depth so that cuts cannot form cycles. Depth
/// is tracked per symbol position and per cut source span; `depth(x, d)`
/// reads "the depth of `x` is at least `d`". Concat and run-length
/// references carry depth from source symbols to referrer symbols, cuts add
/// a strict step, and any cycle climbs past the `depth(x, n)` sentinel.
fn emit_depth_constraints(
    candidates: &Candidates,
    lm: &mut LiteralManager,
    wcnf: &mut Wcnf,
    n: usize,
) -> Result<()> {
    fn depth(lm: &mut LiteralManager, i: usize, l: usize, d: usize) -> Result<VarId> {
        lm.get_or_create(LitKey::Depth { i, l, d })
    }

    fn link(
        lm: &mut LiteralManager,
        wcnf: &mut Wcnf,
        active: VarId,
        src_pos: usize,
        dst_pos: usize,
        n: usize,
    ) -> Result<()> {
        for d in 1..=n {
            let from = depth(lm, src_pos, 1, d)?;
            let to = depth(lm, dst_pos, 1, d)?;
            wcnf.add_hard(vec![active.nlit(), from.nlit(), to.lit()]);
        }
        Ok(())
    }

    let mut spans: Vec<Interval> = candidates.trunc_by_src.keys().copied().collect();
    spans.sort_unstable();

    let singles = (0..n).map(|p| (p, 1));
    for (i, l) in singles.chain(spans.iter().copied()) {
        wcnf.add_hard_unit(depth(lm, i, l, 0)?.lit());
        wcnf.add_hard_unit(depth(lm, i, l, n)?.nlit());
        for d in 1..=n {
            let hi = depth(lm, i, l, d)?;
            let lo = depth(lm, i, l, d - 1)?;
            wcnf.add_hard(cnf::implies(hi.lit(), lo.lit()));
        }
    }

    // A span's depth is the maximum of its symbols' depths.
    for &(i, l) in &spans {
        for d in 0..=n {
            let span_d = depth(lm, i, l, d)?;
            for p in i..i + l {
                let sym_d = depth(lm, p, 1, d)?;
                wcnf.add_hard(cnf::implies(sym_d.lit(), span_d.lit()));
            }
            if d >= 1 {
                let mut witness: Clause = vec![span_d.nlit()];
                for p in i..i + l {
                    witness.push(depth(lm, p, 1, d)?.lit());
                }
                wcnf.add_hard(witness);
            }
        }
    }

    // Expanding an active reference replays its source's symbols, so every
    // referrer symbol is at least as deep as the symbol it copies.
    let mut concat_keys: Vec<Interval> = candidates.concat_by_dst.keys().copied().collect();
    concat_keys.sort_unstable();
    for (dst, len) in concat_keys {
        let Some(srcs) = candidates.concat_by_dst.get(&(dst, len)) else {
            continue;
        };
        for &src in srcs {
            let r = lm.get_or_create(LitKey::ConcatRef { src, dst, len })?;
            for k in 0..len {
                link(lm, wcnf, r, src + k, dst + k, n)?;
            }
        }
    }
    let mut rl_keys: Vec<Interval> = candidates.rl_by_dst.keys().copied().collect();
    rl_keys.sort_unstable();
    for (dst, len) in rl_keys {
        let Some(srcs) = candidates.rl_by_dst.get(&(dst, len)) else {
            continue;
        };
        for &src in srcs {
            let r = lm.get_or_create(LitKey::RunLenRef { src, dst, len })?;
            let unit_len = dst - src;
            for k in 0..len {
                link(lm, wcnf, r, src + k % unit_len, dst + k, n)?;
            }
        }
    }

    // An active cut places the referrer's symbols strictly below its source.
    let mut cut_dsts: Vec<Interval> = candidates.trunc_by_dst.keys().copied().collect();
    cut_dsts.sort_unstable();
    for (dst, dst_len) in cut_dsts {
        let Some(sources) = candidates.trunc_by_dst.get(&(dst, dst_len)) else {
            continue;
        };
        for s in sources {
            let key = LitKey::TruncRef {
                src: s.src,
                src_len: s.src_len,
                dst,
                dst_len,
            };
            let t = lm.get_or_create(key)?;
            for d in 0..n {
                let src_d = depth(lm, s.src, s.src_len, d)?;
                for p in dst..dst + dst_len {
                    let sym = depth(lm, p, 1, d + 1)?;
                    wcnf.add_hard(vec![t.nlit(), src_d.nlit(), sym.lit()]);
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::build;
    use crate::compressor::options::{CompressorOptions, Mode};
    use crate::literal::LitKey;

    #[test]
    fn soft_clauses_cover_interior_boundaries() {
        let options = CompressorOptions::builder().mode(Mode::Slp).build();
        let built = build(b"abab", &options).unwrap();
        // Three interior positions, no cut candidates in SLP mode.
        assert_eq!(built.wcnf.soft().len(), 3);
    }

    #[test]
    fn undefinable_phrases_are_forced_false() {
        let options = CompressorOptions::builder().mode(Mode::Slp).build();
        let mut built = build(b"abab", &options).unwrap();
        // "ba" at position 1 has no earlier copy, so phrase(1,2) is banned.
        let phrase = built
            .literals
            .get_or_create(LitKey::Phrase { i: 1, l: 2 })
            .unwrap();
        assert!(built
            .wcnf
            .hard()
            .iter()
            .any(|c| c.as_slice() == [phrase.nlit()]));
        // "ab" at position 2 copies position 0 and is not banned.
        let ok = built
            .literals
            .get_or_create(LitKey::Phrase { i: 2, l: 2 })
            .unwrap();
        assert!(!built.wcnf.hard().iter().any(|c| c.as_slice() == [ok.nlit()]));
    }

    #[test]
    fn collage_mode_pays_for_cuts() {
        let options = CompressorOptions::builder().mode(Mode::Collage).build();
        let built = build(b"abcxabcy", &options).unwrap();
        let cut_candidates: usize = built.candidates.trunc_by_dst.values().map(Vec::len).sum();
        assert!(cut_candidates > 0);
        assert_eq!(built.wcnf.soft().len(), 7 + cut_candidates);
        // Depth stratification exists for cut sources.
        assert!(built
            .literals
            .contains(&LitKey::Depth { i: 0, l: 1, d: 0 }));
    }

    #[test]
    fn references_carry_depth_into_cut_sources() {
        let options = CompressorOptions::builder().mode(Mode::Collage).build();
        let mut built = build(b"abcxabcy", &options).unwrap();
        // "abc" at 4 copies 0..3. Without the depth link, a cut of 1..3 out
        // of 4..8 closes an expandable cycle through that copy.
        let r = built
            .literals
            .get_or_create(LitKey::ConcatRef {
                src: 0,
                dst: 4,
                len: 3,
            })
            .unwrap();
        let from = built
            .literals
            .get_or_create(LitKey::Depth { i: 1, l: 1, d: 1 })
            .unwrap();
        let to = built
            .literals
            .get_or_create(LitKey::Depth { i: 5, l: 1, d: 1 })
            .unwrap();
        assert!(built
            .wcnf
            .hard()
            .iter()
            .any(|c| c.as_slice() == [r.nlit(), from.nlit(), to.lit()]));
    }
}
