use crate::intern::ConstantId;

#[derive(Debug)]
struct Frame {
    reset: bool,
    ids: Vec<ConstantId>,
}

/// The scoped set of type-variable names currently bound.
///
/// A stack of frames. Regular frames accumulate names; a *reset* frame marks
/// a declaration boundary across which outer type variables are invisible
/// (class/module/interface/alias bodies). Method types and blocks push plain
/// frames, so their variables nest inside the declaration's.
#[derive(Debug, Default)]
pub(crate) struct TypeVarTable {
    frames: Vec<Frame>,
}

impl TypeVarTable {
    /// Push a scope. With `reset` set, a reset frame goes underneath the new
    /// regular frame, cutting off lookup into outer scopes.
    pub(crate) fn push(&mut self, reset: bool) {
        if reset {
            self.frames.push(Frame {
                reset: true,
                ids: Vec::new(),
            });
        }
        self.frames.push(Frame {
            reset: false,
            ids: Vec::new(),
        });
    }

    /// Pop the scope pushed by the matching [`push`](Self::push), including
    /// its reset frame if it had one.
    pub(crate) fn pop(&mut self) {
        let frame = self.frames.pop();
        debug_assert!(frame.is_some(), "popped an empty type-variable table");
        if self.frames.last().is_some_and(|frame| frame.reset) {
            self.frames.pop();
        }
    }

    /// Bind a name in the innermost scope. Fails on a reset frame, which
    /// only ever happens through API misuse.
    pub(crate) fn insert(&mut self, id: ConstantId) -> Result<(), &'static str> {
        match self.frames.last_mut() {
            Some(frame) if !frame.reset => {
                frame.ids.push(id);
                Ok(())
            }
            Some(_) => Err("cannot insert into a reset table"),
            None => Err("cannot insert into an empty table"),
        }
    }

    /// Whether `id` is visible from the innermost scope: search upward
    /// through regular frames, stopping at the first reset frame.
    pub(crate) fn member(&self, id: ConstantId) -> bool {
        for frame in self.frames.iter().rev() {
            if frame.reset {
                return false;
            }
            if frame.ids.contains(&id) {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intern::ConstantPool;

    #[test]
    fn reset_frames_hide_outer_variables() {
        let mut pool = ConstantPool::new();
        let t = pool.intern(b"T");
        let u = pool.intern(b"U");

        let mut vars = TypeVarTable::default();
        vars.push(true);
        vars.insert(t).unwrap();
        assert!(vars.member(t));

        // method type scope: outer vars stay visible
        vars.push(false);
        vars.insert(u).unwrap();
        assert!(vars.member(t));
        assert!(vars.member(u));
        vars.pop();
        assert!(!vars.member(u));

        // nested declaration scope: outer vars are hidden
        vars.push(true);
        assert!(!vars.member(t));
        vars.pop();
        assert!(vars.member(t));
    }

    #[test]
    fn pop_removes_reset_frame_too() {
        let mut vars = TypeVarTable::default();
        vars.push(true);
        vars.push(true);
        vars.pop();
        vars.pop();
        let mut pool = ConstantPool::new();
        let id = pool.intern(b"X");
        assert!(vars.insert(id).is_err());
    }
}
