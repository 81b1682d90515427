use rustc_hash::FxHashMap;

use crate::literal::{LitKey, VarId};
use crate::{Error, Result};

/// Registry assigning dense 1-based [`VarId`]s to structured literal keys.
///
/// One manager is created per solve call; there is no process-wide state.
/// Creation validates the key's index tuple against the text length and
/// fails with [`Error::InvalidLiteral`] on violation. A violation is a
/// builder bug, not a recoverable runtime condition.
#[derive(Debug)]
pub struct LiteralManager {
    n: usize,
    ids: FxHashMap<LitKey, VarId>,
    keys: Vec<LitKey>,
    next_aux: usize,
}

impl LiteralManager {
    #[must_use]
    pub fn new(text_len: usize) -> Self {
        LiteralManager {
            n: text_len,
            ids: FxHashMap::default(),
            keys: Vec::new(),
            next_aux: 0,
        }
    }

    /// Number of variables handed out so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Get the id for `key`, creating and validating it on first use.
    pub fn get_or_create(&mut self, key: LitKey) -> Result<VarId> {
        if let Some(&id) = self.ids.get(&key) {
            return Ok(id);
        }
        self.validate(&key)?;
        Ok(self.insert(key))
    }

    /// A fresh Tseitin definition variable.
    pub fn fresh_aux(&mut self) -> VarId {
        let key = LitKey::Aux { id: self.next_aux };
        self.next_aux += 1;
        self.insert(key)
    }

    #[must_use]
    pub fn lookup(&self, key: &LitKey) -> Option<VarId> {
        self.ids.get(key).copied()
    }

    #[must_use]
    pub fn contains(&self, key: &LitKey) -> bool {
        self.ids.contains_key(key)
    }

    /// Reverse lookup for debugging and serialization.
    #[must_use]
    pub fn describe(&self, id: VarId) -> Option<&LitKey> {
        self.keys.get((id.0 as usize).wrapping_sub(1))
    }

    fn insert(&mut self, key: LitKey) -> VarId {
        let id = VarId(self.keys.len() as u32 + 1);
        self.ids.insert(key.clone(), id);
        self.keys.push(key);
        id
    }

    fn validate(&self, key: &LitKey) -> Result<()> {
        let n = self.n;
        let fail = |reason: &str| {
            Err(Error::InvalidLiteral {
                key: key.clone(),
                reason: reason.to_owned(),
            })
        };

        match *key {
            LitKey::Phrase { i, l } | LitKey::Referenced { i, l } => {
                if l == 0 || i + l > n {
                    return fail("interval out of range");
                }
            }
            LitKey::PhraseStart { i } => {
                if i > n {
                    return fail("position out of range");
                }
            }
            LitKey::ConcatRef { src, dst, len } => {
                if len < 2 || dst + len > n {
                    return fail("interval out of range");
                }
                if src + len > dst {
                    return fail("source must precede referrer without overlap");
                }
            }
            LitKey::RunLenRef { src, dst, len } => {
                if len < 2 || dst + len > n {
                    return fail("interval out of range");
                }
                if src >= dst || dst >= src + len {
                    return fail("unit and referrer must properly overlap");
                }
                if len % (dst - src) != 0 {
                    return fail("unit length must divide the referrer length");
                }
            }
            LitKey::TruncRef {
                src,
                src_len,
                dst,
                dst_len,
            } => {
                if dst_len < 2 || src_len <= dst_len {
                    return fail("source must be strictly longer than the slice");
                }
                if src + src_len > n || dst + dst_len > n {
                    return fail("interval out of range");
                }
                if dst + dst_len > src && src + src_len > dst {
                    return fail("source and referrer must not overlap");
                }
            }
            LitKey::Depth { i, l, d } => {
                if l == 0 || i + l > n || d > n {
                    return fail("depth index out of range");
                }
            }
            LitKey::Aux { .. } => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::LiteralManager;
    use crate::literal::LitKey;

    #[test]
    fn ids_are_dense_and_stable() {
        let mut lm = LiteralManager::new(4);
        let a = lm.get_or_create(LitKey::PhraseStart { i: 0 }).unwrap();
        let b = lm.get_or_create(LitKey::Phrase { i: 0, l: 2 }).unwrap();
        let a2 = lm.get_or_create(LitKey::PhraseStart { i: 0 }).unwrap();

        assert_eq!(a.0, 1);
        assert_eq!(b.0, 2);
        assert_eq!(a, a2);
        assert_eq!(lm.len(), 2);
        assert_eq!(lm.describe(b), Some(&LitKey::Phrase { i: 0, l: 2 }));
    }

    #[test]
    fn rejects_invalid_indices() {
        let mut lm = LiteralManager::new(4);
        assert!(lm.get_or_create(LitKey::Phrase { i: 3, l: 2 }).is_err());
        assert!(lm.get_or_create(LitKey::PhraseStart { i: 5 }).is_err());
        // Overlapping concat reference.
        assert!(lm
            .get_or_create(LitKey::ConcatRef {
                src: 0,
                dst: 1,
                len: 2
            })
            .is_err());
        // Unit length does not divide the referrer length.
        let mut lm6 = LiteralManager::new(6);
        assert!(lm6
            .get_or_create(LitKey::RunLenRef {
                src: 0,
                dst: 2,
                len: 3,
            })
            .is_err());
        // Truncation source overlapping its referrer.
        assert!(lm
            .get_or_create(LitKey::TruncRef {
                src: 0,
                src_len: 3,
                dst: 2,
                dst_len: 2
            })
            .is_err());
    }

    #[test]
    fn aux_variables_interleave() {
        let mut lm = LiteralManager::new(2);
        let a = lm.get_or_create(LitKey::PhraseStart { i: 0 }).unwrap();
        let x = lm.fresh_aux();
        let b = lm.get_or_create(LitKey::PhraseStart { i: 1 }).unwrap();
        assert_eq!((a.0, x.0, b.0), (1, 2, 3));
        assert_eq!(lm.describe(x), Some(&LitKey::Aux { id: 0 }));
    }
}
