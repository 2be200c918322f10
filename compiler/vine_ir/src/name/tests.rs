use super::*;

#[test]
fn intern_is_stable() {
    let interner = StringInterner::new();
    let a = interner.intern("counter");
    let b = interner.intern("counter");
    let c = interner.intern("total");
    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(interner.lookup(a), "counter");
    assert_eq!(interner.lookup(c), "total");
}

#[test]
fn empty_is_preinterned() {
    let interner = StringInterner::new();
    assert_eq!(interner.intern(""), Name::EMPTY);
    assert_eq!(interner.len(), 1);
}

#[test]
fn unknown_name_resolves_empty() {
    let a = StringInterner::new();
    let b = StringInterner::new();
    for word in ["one", "two", "three"] {
        b.intern(word);
    }
    let foreign = b.intern("three");
    assert_eq!(a.lookup(foreign), "");
}

#[test]
fn shared_interner_across_threads() {
    let interner = StringInterner::shared();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let interner = Arc::clone(&interner);
            std::thread::spawn(move || interner.intern("shared"))
        })
        .collect();
    let names: Vec<Name> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(names.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(interner.len(), 2);
}
