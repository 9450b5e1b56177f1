use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AwaitError {
    #[error("awaitable already resolved")]
    AlreadyResolved,
}

/// What the presentation layer reports when it finishes a suspended step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The line was acknowledged or the animation/sound/timer finished.
    Continue,
    /// A menu entry was picked.
    Choose(usize),
}

type Receiver<T, U> = Box<dyn FnOnce(U) -> T>;
type Listener<T> = Box<dyn FnOnce(T)>;

struct Inner<T, U> {
    receiver: Option<Receiver<T, U>>,
    result: Option<T>,
    listeners: Vec<Listener<T>>,
}

/// A value computed once from the input handed to [`Awaitable::resolve`].
///
/// Clones share state, so the interpreter and the presentation layer can
/// each hold one. Not `Send`.
pub struct Awaitable<T, U> {
    inner: Rc<RefCell<Inner<T, U>>>,
}

impl<T, U> Clone for Awaitable<T, U> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug, U> fmt::Debug for Awaitable<T, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Awaitable")
            .field("result", &inner.result)
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

impl<T: Clone + 'static, U: 'static> Awaitable<T, U> {
    pub fn new(receiver: impl FnOnce(U) -> T + 'static) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                receiver: Some(Box::new(receiver)),
                result: None,
                listeners: Vec::new(),
            })),
        }
    }

    /// Compute the result and notify listeners in registration order.
    pub fn resolve(&self, value: U) -> Result<(), AwaitError> {
        let receiver = self
            .inner
            .borrow_mut()
            .receiver
            .take()
            .ok_or(AwaitError::AlreadyResolved)?;
        let result = receiver(value);
        let listeners = {
            let mut inner = self.inner.borrow_mut();
            inner.result = Some(result.clone());
            std::mem::take(&mut inner.listeners)
        };
        for listener in listeners {
            listener(result.clone());
        }
        Ok(())
    }

    pub fn is_solved(&self) -> bool {
        self.inner.borrow().result.is_some()
    }

    pub fn result(&self) -> Option<T> {
        self.inner.borrow().result.clone()
    }

    /// Run `callback` with the result, now if solved, otherwise on resolve.
    pub fn then(&self, callback: impl FnOnce(T) + 'static) {
        let solved = self.result();
        match solved {
            Some(result) => callback(result),
            None => self.inner.borrow_mut().listeners.push(Box::new(callback)),
        }
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}
