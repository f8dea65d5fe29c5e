use std::{
    sync::{
        mpsc::{channel, Receiver, Sender},
        Arc, PoisonError, RwLock,
    },
    thread,
};

/// Fans events out to every live observer. Observers whose receiver was
/// dropped are removed on the next notify.
#[derive(Clone)]
pub struct Notifier<Event: Send + Sync + Clone + 'static> {
    senders: Arc<RwLock<Vec<Sender<Event>>>>,
}

impl<Event: Send + Sync + Clone + 'static> Default for Notifier<Event> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Event: Send + Sync + Clone + 'static> Notifier<Event> {
    pub fn new() -> Self {
        Self {
            senders: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn notify(&self, event: Event) {
        // Poisoning leaves the sender list intact
        let mut senders = self.senders.write().unwrap_or_else(PoisonError::into_inner);
        senders.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn observer(&self) -> Receiver<Event> {
        let (tx, rx) = channel();
        self.senders
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    pub fn observe(&self, mut callback: impl FnMut(Event) + Send + 'static) {
        let rx = self.observer();
        thread::spawn(move || {
            rx.iter().for_each(|e| callback(e));
        });
    }

    pub fn observer_count(&self) -> usize {
        self.senders
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::Notifier;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[test]
    fn test_single_observer() {
        let notifier = Notifier::<String>::new();
        let rx = notifier.observer();

        notifier.notify("hello".to_string());
        let received = rx.recv_timeout(Duration::from_millis(100)).unwrap();
        assert_eq!(received, "hello");
    }

    #[test]
    fn test_multiple_observers() {
        let notifier = Notifier::<i32>::new();
        let rx1 = notifier.observer();
        let rx2 = notifier.observer();

        notifier.notify(42);

        assert_eq!(rx1.recv_timeout(Duration::from_millis(100)).unwrap(), 42);
        assert_eq!(rx2.recv_timeout(Duration::from_millis(100)).unwrap(), 42);
    }

    #[test]
    fn test_dropped_observer_is_pruned() {
        let notifier = Notifier::<i32>::new();
        let rx1 = notifier.observer();
        let rx2 = notifier.observer();
        drop(rx2);

        notifier.notify(1);
        assert_eq!(notifier.observer_count(), 1);
        assert_eq!(rx1.recv_timeout(Duration::from_millis(100)).unwrap(), 1);
    }

    #[test]
    fn test_observe_callback() {
        let notifier = Notifier::<String>::new();
        let received = Arc::new(Mutex::new(Vec::<String>::new()));
        let received_clone = received.clone();

        notifier.observe(move |event| {
            received_clone.lock().unwrap().push(event);
        });

        notifier.notify("saved".to_string());
        std::thread::sleep(Duration::from_millis(50));

        assert_eq!(*received.lock().unwrap(), vec!["saved".to_string()]);
    }
}
