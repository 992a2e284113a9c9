use crate::Show;

/// The effect a symbol has on the channel.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Action<M> {
    /// Enqueues the message.
    Push(M),
    /// Dequeues the oldest message, which must be equal to the given one.
    Pull(M),
    /// Leaves the channel untouched.
    Pass,
}

impl<M> Action<M> {
    /// The message that is pushed or pulled, `None` for [`Action::Pass`].
    pub fn message(&self) -> Option<&M> {
        match self {
            Action::Push(m) | Action::Pull(m) => Some(m),
            Action::Pass => None,
        }
    }

    /// Returns true if `self` is a push.
    pub fn is_push(&self) -> bool {
        matches!(self, Action::Push(_))
    }

    /// Returns true if `self` is a pull.
    pub fn is_pull(&self) -> bool {
        matches!(self, Action::Pull(_))
    }

    /// Returns true if `self` is a pull of exactly `message`.
    pub fn pulls(&self, message: &M) -> bool
    where
        M: PartialEq,
    {
        matches!(self, Action::Pull(m) if m == message)
    }
}

impl<M: Show> Show for Action<M> {
    fn show(&self) -> String {
        match self {
            Action::Push(m) => format!("!{}", m.show()),
            Action::Pull(m) => format!("?{}", m.show()),
            Action::Pass => String::new(),
        }
    }
}

/// A symbol of an annotated alphabet. It pairs a plain symbol with the [`Action`] it performs on
/// the channel. The action is determined when the symbol is created and can not be changed
/// afterwards.
///
/// Symbols are ordered by their plain symbol first and by their action second.
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct AnnotatedSymbol<S = char, M = char> {
    symbol: S,
    action: Action<M>,
}

impl<S, M> AnnotatedSymbol<S, M> {
    /// A symbol that pushes `message`.
    pub fn push(symbol: S, message: M) -> Self {
        Self {
            symbol,
            action: Action::Push(message),
        }
    }

    /// A symbol that pulls `message`.
    pub fn pull(symbol: S, message: M) -> Self {
        Self {
            symbol,
            action: Action::Pull(message),
        }
    }

    /// A symbol without effect on the channel.
    pub fn pass(symbol: S) -> Self {
        Self {
            symbol,
            action: Action::Pass,
        }
    }

    /// The plain symbol.
    pub fn symbol(&self) -> &S {
        &self.symbol
    }

    /// The channel action.
    pub fn action(&self) -> &Action<M> {
        &self.action
    }

    /// Shorthand for `self.action().message()`.
    pub fn message(&self) -> Option<&M> {
        self.action.message()
    }
}

impl<S: Show, M: Show> Show for AnnotatedSymbol<S, M> {
    fn show(&self) -> String {
        format!("{}{}", self.symbol.show(), self.action.show())
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn annotated_symbols() {
        let a = AnnotatedSymbol::push('a', 'm');
        let b = AnnotatedSymbol::pull('b', 'm');
        let c: AnnotatedSymbol = AnnotatedSymbol::pass('c');

        assert!(a.action().is_push());
        assert!(b.action().pulls(&'m'));
        assert!(!b.action().pulls(&'n'));
        assert_eq!(c.message(), None);
        assert_eq!(vec![a.clone(), b.clone(), c.clone()].show(), "a!m b?m c");
        assert!(a < b && b < c);
    }
}
