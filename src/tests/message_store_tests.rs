use crate::core::MessageStore;
use crate::infer::InferError;

#[test]
fn store_lifecycle_logic() {
    let mut store = MessageStore::create(4, 3, 0.25).unwrap();
    assert_eq!(store.message(0), [0.25, 0.25, 0.25]);
    assert_eq!(store.message(3), [0.25, 0.25, 0.25]);
    // a write into the next buffer is invisible until the swap
    {
        let (current, next) = store.split();
        assert_eq!(&current[..3], [0.25, 0.25, 0.25]);
        next[2 * 3..3 * 3].copy_from_slice(&[0.1, 0.2, 0.7]);
    }
    assert_eq!(store.message(2), [0.25, 0.25, 0.25]);
    store.swap();
    assert_eq!(store.message(2), [0.1, 0.2, 0.7]);
    assert_eq!(store.message(0), [0.25, 0.25, 0.25]);
    // in-place updates land in the current buffer
    store.message_mut(0)[1] = 0.5;
    assert_eq!(store.message(0), [0.25, 0.5, 0.25]);
    // the previous buffer is intact on the other side of a second swap
    store.swap();
    assert_eq!(store.message(2), [0.25, 0.25, 0.25]);
}

#[test]
fn allocation_failure_is_reported() {
    let error = MessageStore::create(usize::MAX / 64, 8, 0f64).unwrap_err();
    assert!(matches!(error, InferError::OutOfMemory { .. }));
}
