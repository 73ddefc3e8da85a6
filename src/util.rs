use std::thread;

use log::debug;

use crate::errors::Result;

/// Runs `op` for every item on its own scoped thread and returns the results in input order.
///
/// Every operation writes into a pre-sized slot of its own, so completion order never leaks
/// into the output. If any operation fails, the first error in input order is returned and
/// all other results are dropped.
pub fn join_ordered<T, R, F>(items: &[T], op: F) -> Result<Vec<R>>
where
    T: Sync,
    R: Send,
    F: Fn(usize, &T) -> Result<R> + Sync,
{
    if items.len() < 2 {
        return items.iter().enumerate().map(|(i, item)| op(i, item)).collect();
    }

    let mut slots: Vec<Option<Result<R>>> = Vec::with_capacity(items.len());
    slots.resize_with(items.len(), || None);

    thread::scope(|s| {
        let op = &op;
        for (i, (item, slot)) in items.iter().zip(slots.iter_mut()).enumerate() {
            s.spawn(move || {
                *slot = Some(op(i, item));
            });
        }
    });
    debug!("joined {} operations", items.len());

    slots
        .into_iter()
        .map(|slot| slot.unwrap_or_else(|| Err(format_err!("operation did not complete"))))
        .collect()
}
