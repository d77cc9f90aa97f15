//! Reactive fields with synchronous, ordered change notification

use crate::{Error, ListenerError, Result, SubscriptionId};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

type Getter<T> = Box<dyn Fn() -> T>;
type Setter<T> = Box<dyn Fn(T)>;
type Listener<T> = Rc<dyn Fn(&T, &T) -> std::result::Result<(), ListenerError>>;

struct FieldInner<T> {
    get: Getter<T>,
    set: Setter<T>,
    listeners: RefCell<Vec<(SubscriptionId, Listener<T>)>>,
    next_subscription: Cell<u64>,
}

/// Handle returned by [`ReactiveField::subscribe`]
///
/// The handle does not keep the field or the listener alive on its own;
/// pass it back to `unsubscribe` to stop receiving notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    id: SubscriptionId,
}

impl Subscription {
    /// The identifier of this subscription
    pub fn id(&self) -> SubscriptionId {
        self.id
    }
}

/// An observable value bound to a location inside a state bag
///
/// Reads go straight to the bound location, so a field never returns a stale
/// value. Every `set` writes through the setter and then calls each listener
/// with `(old, new)` in subscription order before returning, whether or not
/// the value changed.
///
/// Cloning a field yields another handle to the same binding and listeners.
pub struct ReactiveField<T> {
    inner: Rc<FieldInner<T>>,
}

impl<T: Clone + 'static> ReactiveField<T> {
    /// Create a field from an explicit getter/setter pair
    pub fn new(get: impl Fn() -> T + 'static, set: impl Fn(T) + 'static) -> Self {
        Self {
            inner: Rc::new(FieldInner {
                get: Box::new(get),
                set: Box::new(set),
                listeners: RefCell::new(Vec::new()),
                next_subscription: Cell::new(0),
            }),
        }
    }

    /// Bind a field to a location inside a shared bag
    pub fn bind<B: 'static>(
        bag: Rc<RefCell<B>>,
        get: impl Fn(&B) -> T + 'static,
        set: impl Fn(&mut B, T) + 'static,
    ) -> Self {
        let reader = bag.clone();
        Self::new(
            move || get(&*reader.borrow()),
            move |value| set(&mut *bag.borrow_mut(), value),
        )
    }

    /// Create a field that owns its value instead of pointing into a bag
    pub fn local(initial: T) -> Self {
        let cell = Rc::new(RefCell::new(initial));
        Self::bind(cell, |v: &T| v.clone(), |v: &mut T, new| *v = new)
    }

    /// Read the current value
    pub fn get(&self) -> T {
        (self.inner.get)()
    }

    /// Write a value and notify every listener
    ///
    /// Listeners observe the value as stored, which may differ from `value`
    /// when the setter normalizes it. A failing listener does not stop the
    /// remaining ones; all failures are returned together once every
    /// listener has run. Earlier listeners are not rolled back.
    pub fn set(&self, value: T) -> Result<()> {
        let old = self.get();
        (self.inner.set)(value);
        let new = self.get();
        self.notify(&old, &new)
    }

    /// Register a listener, returning the handle used to remove it
    pub fn subscribe(
        &self,
        listener: impl Fn(&T, &T) -> std::result::Result<(), ListenerError> + 'static,
    ) -> Subscription {
        let id = SubscriptionId::new(self.inner.next_subscription.get());
        self.inner.next_subscription.set(id.raw() + 1);
        let listener: Listener<T> = Rc::new(listener);
        self.inner.listeners.borrow_mut().push((id, listener));
        Subscription { id }
    }

    /// Remove a listener
    ///
    /// Returns false when the subscription was already removed.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let mut listeners = self.inner.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(id, _)| *id != subscription.id);
        listeners.len() != before
    }

    /// Remove every listener
    pub fn unsubscribe_all(&self) {
        self.inner.listeners.borrow_mut().clear();
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// A read-only view of this field
    pub fn reader(&self) -> FieldReader<T> {
        FieldReader {
            field: self.clone(),
        }
    }

    fn notify(&self, old: &T, new: &T) -> Result<()> {
        // Snapshot so listeners may subscribe or unsubscribe while being notified
        let listeners: Vec<Listener<T>> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();

        let mut failures = Vec::new();
        for listener in &listeners {
            if let Err(err) = listener(old, new) {
                failures.push(err);
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::ListenersFailed {
                notified: listeners.len(),
                failures,
            })
        }
    }
}

impl<T> Clone for ReactiveField<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + fmt::Debug + 'static> fmt::Debug for ReactiveField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveField")
            .field("value", &self.get())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Read-and-subscribe view of a [`ReactiveField`]
///
/// Observers such as views get this instead of the field itself, so the only
/// way to change the value stays with the owning façade.
pub struct FieldReader<T> {
    field: ReactiveField<T>,
}

impl<T: Clone + 'static> FieldReader<T> {
    /// Read the current value
    pub fn get(&self) -> T {
        self.field.get()
    }

    /// Register a listener
    pub fn subscribe(
        &self,
        listener: impl Fn(&T, &T) -> std::result::Result<(), ListenerError> + 'static,
    ) -> Subscription {
        self.field.subscribe(listener)
    }

    /// Remove a listener
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        self.field.unsubscribe(subscription)
    }
}

impl<T> Clone for FieldReader<T> {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
        }
    }
}

impl<T: Clone + fmt::Debug + 'static> fmt::Debug for FieldReader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FieldReader").field(&self.get()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default)]
    struct Profile {
        nickname: String,
        score: i64,
    }

    fn score_field(bag: &Rc<RefCell<Profile>>) -> ReactiveField<i64> {
        ReactiveField::bind(bag.clone(), |p: &Profile| p.score, |p: &mut Profile, v| p.score = v)
    }

    #[test]
    fn test_reads_are_never_stale() {
        let bag = Rc::new(RefCell::new(Profile::default()));
        let field = score_field(&bag);

        bag.borrow_mut().score = 40;
        assert_eq!(field.get(), 40);

        field.set(41).unwrap();
        assert_eq!(bag.borrow().score, 41);
    }

    #[test]
    fn test_listeners_run_in_subscription_order() {
        let field = ReactiveField::local(0i64);
        let order = Rc::new(RefCell::new(Vec::new()));

        for tag in ["a", "b", "c"] {
            let order = order.clone();
            field.subscribe(move |old, new| {
                order.borrow_mut().push(format!("{tag}:{old}->{new}"));
                Ok(())
            });
        }

        field.set(5).unwrap();
        assert_eq!(*order.borrow(), vec!["a:0->5", "b:0->5", "c:0->5"]);
    }

    #[test]
    fn test_set_fires_even_when_value_is_unchanged() {
        let field = ReactiveField::local(3u32);
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        field.subscribe(move |_, _| {
            counter.set(counter.get() + 1);
            Ok(())
        });

        field.set(3).unwrap();
        field.set(3).unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_listener_failure_is_reported_after_all_listeners_ran() {
        let field = ReactiveField::local(0i64);
        let last_ran = Rc::new(Cell::new(false));

        field.subscribe(|_, _| Err(ListenerError::new("first broke")));
        let flag = last_ran.clone();
        field.subscribe(move |_, _| {
            flag.set(true);
            Ok(())
        });

        let err = field.set(9).unwrap_err();
        assert!(last_ran.get());
        assert_eq!(field.get(), 9);
        match err {
            Error::ListenersFailed { notified, failures } => {
                assert_eq!(notified, 2);
                assert_eq!(failures, vec![ListenerError::new("first broke")]);
            }
        }
    }

    #[test]
    fn test_unsubscribe() {
        let field = ReactiveField::local(0u32);
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let sub = field.subscribe(move |_, _| {
            counter.set(counter.get() + 1);
            Ok(())
        });

        field.set(1).unwrap();
        assert!(field.unsubscribe(sub));
        assert!(!field.unsubscribe(sub));
        field.set(2).unwrap();

        assert_eq!(calls.get(), 1);
        assert_eq!(field.listener_count(), 0);
    }

    #[test]
    fn test_listener_may_read_and_subscribe_during_notification() {
        let field = ReactiveField::local(String::new());
        let echo = field.clone();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();

        field.subscribe(move |_, new| {
            sink.borrow_mut().push(echo.get());
            assert_eq!(&echo.get(), new);
            echo.subscribe(|_, _| Ok(()));
            Ok(())
        });

        field.set("ada".to_string()).unwrap();
        assert_eq!(*seen.borrow(), vec!["ada".to_string()]);
        assert_eq!(field.listener_count(), 2);
    }

    #[test]
    fn test_setter_normalization_is_visible_to_listeners() {
        let bag = Rc::new(RefCell::new(Profile::default()));
        let nickname = ReactiveField::bind(
            bag.clone(),
            |p: &Profile| p.nickname.clone(),
            |p: &mut Profile, v: String| p.nickname = v.trim().to_string(),
        );
        let seen = Rc::new(RefCell::new(String::new()));
        let sink = seen.clone();
        nickname.subscribe(move |_, new| {
            *sink.borrow_mut() = new.clone();
            Ok(())
        });

        nickname.set("  neo  ".to_string()).unwrap();
        assert_eq!(*seen.borrow(), "neo");
    }

    #[test]
    fn test_reader_shares_listeners() {
        let field = ReactiveField::local(1u32);
        let reader = field.reader();
        let seen = Rc::new(Cell::new(0));
        let sink = seen.clone();
        reader.subscribe(move |_, new| {
            sink.set(*new);
            Ok(())
        });

        field.set(8).unwrap();
        assert_eq!(reader.get(), 8);
        assert_eq!(seen.get(), 8);
    }
}
