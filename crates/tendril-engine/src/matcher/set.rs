//! Set matching: each item pattern needs a distinct witness element;
//! without a `...` residual the set must be exhausted.

use tendril_par::ast::NodeId;
use tendril_value::{PathStep, Value};

use super::{extend, Cont, Matcher, Sig};
use crate::env::Env;

impl<'p> Matcher<'p> {
    pub(crate) fn match_set(
        &self,
        items: &[NodeId],
        open: bool,
        members: &[Value],
        path: &[PathStep],
        env: &mut Env,
        k: Cont,
    ) -> Sig {
        if !open && items.len() < members.len() {
            return Sig::More;
        }
        if items.len() > members.len() {
            return Sig::More;
        }
        let mut used = vec![false; members.len()];
        self.set_items(items, 0, open, members, path, env, &mut used, k)
    }

    /// Backtracking injective assignment of items to members, in
    /// member iteration order.
    #[allow(clippy::too_many_arguments)]
    fn set_items(
        &self,
        items: &[NodeId],
        idx: usize,
        open: bool,
        members: &[Value],
        path: &[PathStep],
        env: &mut Env,
        used: &mut Vec<bool>,
        k: Cont,
    ) -> Sig {
        if idx == items.len() {
            if !open && used.iter().any(|u| !u) {
                return Sig::More;
            }
            return k(env);
        }

        for j in 0..members.len() {
            if used[j] {
                continue;
            }
            used[j] = true;
            let child_path = extend(path, PathStep::Index(j));
            let sig = self.match_one(items[idx], &members[j], &child_path, env, &mut |env| {
                self.set_items(items, idx + 1, open, members, path, env, &mut *used, &mut *k)
            });
            used[j] = false;
            match sig {
                Sig::More => continue,
                other => return other,
            }
        }
        Sig::More
    }
}
