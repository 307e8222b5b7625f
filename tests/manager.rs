use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use poolkit::*;

#[derive(Debug, Default, PartialEq)]
struct Enemy {
    hp: u32,
}

fn tracked<T: Default + Send + 'static>(
    created: &Arc<AtomicUsize>,
    destroyed: &Arc<AtomicUsize>,
) -> PoolBuilder<T> {
    let created = created.clone();
    let destroyed = destroyed.clone();
    PoolCore::builder(move || {
        created.fetch_add(1, Ordering::SeqCst);
        T::default()
    })
    .destroy(move |_| {
        destroyed.fetch_add(1, Ordering::SeqCst);
    })
}

fn counters() -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
    (Arc::new(AtomicUsize::new(0)), Arc::new(AtomicUsize::new(0)))
}

#[test]
fn test_create_get_release() {
    let mut manager = PoolManager::new();
    manager
        .create_pool("enemies", PoolCore::builder(|| Enemy { hp: 100 }))
        .unwrap();

    let enemy: Enemy = manager.get("enemies").unwrap();
    assert_eq!(enemy.hp, 100);
    assert_eq!(manager.stats("enemies").unwrap().active, 1);

    assert_eq!(manager.release("enemies", enemy).unwrap(), Returned::Pooled);
    let stats = manager.stats("enemies").unwrap();
    assert_eq!(stats.idle, 1);
    assert_eq!(stats.active, 0);
}

#[test]
fn test_duplicate_create_returns_existing() {
    let (created, destroyed) = counters();
    let mut manager = PoolManager::new();
    let first = manager
        .create_pool("enemies", tracked::<Enemy>(&created, &destroyed))
        .unwrap();

    let (second_created, second_destroyed) = counters();
    let second = manager
        .create_pool(
            "enemies",
            tracked::<Enemy>(&second_created, &second_destroyed)
                .config(PoolConfig::default().with_initial_capacity(8)),
        )
        .unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(second_created.load(Ordering::SeqCst), 0);
    assert_eq!(manager.len(), 1);
}

#[test]
fn test_duplicate_create_with_other_type_fails() {
    let mut manager = PoolManager::new();
    manager
        .create_pool("shared", PoolCore::builder(|| 0u32))
        .unwrap();

    let err = manager
        .create_pool("shared", PoolCore::builder(String::new))
        .unwrap_err();
    assert!(matches!(err, PoolError::TypeMismatch { .. }));
}

#[test]
fn test_empty_key_is_rejected() {
    let mut manager = PoolManager::new();
    let err = manager
        .create_pool("", PoolCore::builder(|| 0u32))
        .unwrap_err();
    assert!(matches!(err, PoolError::EmptyKey));
    assert!(manager.is_empty());
}

#[test]
fn test_invalid_config_creates_nothing() {
    let mut manager = PoolManager::new();
    let err = manager
        .create_pool(
            "broken",
            PoolCore::builder(|| 0u32).config(PoolConfig::default().with_max_capacity(0)),
        )
        .unwrap_err();
    assert!(matches!(err, PoolError::InvalidConfig(_)));
    assert!(!manager.has_pool("broken"));
}

#[test]
fn test_unknown_pool() {
    let manager = PoolManager::new();
    assert!(matches!(
        manager.get::<u32>("missing"),
        Err(PoolError::PoolNotFound(_))
    ));

    let err = manager.release("missing", 42u32).unwrap_err();
    assert!(matches!(err.error(), PoolError::PoolNotFound(_)));
    assert_eq!(err.into_inner(), 42);

    assert!(matches!(
        manager.prewarm("missing", 3),
        Err(PoolError::PoolNotFound(_))
    ));
    assert!(manager.stats("missing").is_none());
}

#[test]
fn test_wrong_type_lookup() {
    let mut manager = PoolManager::new();
    manager
        .create_pool("numbers", PoolCore::builder(|| 0u32))
        .unwrap();

    assert!(matches!(
        manager.get::<u64>("numbers"),
        Err(PoolError::TypeMismatch { .. })
    ));
    let err = manager.release("numbers", 1u64).unwrap_err();
    assert!(matches!(err.error(), PoolError::TypeMismatch { .. }));
    assert!(manager.pool::<u64>("numbers").is_err());
    assert!(manager.pool::<u32>("numbers").is_ok());
}

#[test]
fn test_rejected_release_hands_item_back() {
    let mut manager = PoolManager::new();
    manager
        .create_pool("enemies", PoolCore::builder(Enemy::default))
        .unwrap();

    let err = manager.release("enemies", Enemy { hp: 3 }).unwrap_err();
    let (error, item) = err.into_parts();
    assert!(matches!(error, PoolError::Rejected(_)));
    assert_eq!(item, Enemy { hp: 3 });
}

#[test]
fn test_type_keyed_pool_is_created_on_first_get() {
    let mut manager = PoolManager::new();
    assert!(!manager.has_pool(PoolKey::of::<Enemy>()));

    let enemy = manager.get_or_create_default::<Enemy>().unwrap();
    assert!(manager.has_pool(PoolKey::of::<Enemy>()));
    manager.release(PoolKey::of::<Enemy>(), enemy).unwrap();

    let _again = manager.get_or_create_default::<Enemy>().unwrap();
    let stats = manager.stats(PoolKey::of::<Enemy>()).unwrap();
    assert_eq!(stats.total_created, 1);
    assert_eq!(manager.len(), 1);
}

#[test]
fn test_prewarm_and_clear_through_manager() {
    let mut manager = PoolManager::new();
    manager
        .create_pool(
            "orbs",
            PoolCore::builder(|| 0u8).config(PoolConfig::default().with_max_capacity(4)),
        )
        .unwrap();

    assert_eq!(manager.prewarm("orbs", 10).unwrap(), 4);
    assert_eq!(manager.stats("orbs").unwrap().idle, 4);
    assert_eq!(manager.clear_pool("orbs").unwrap(), 4);
    assert_eq!(manager.stats("orbs").unwrap().idle, 0);
}

#[test]
fn test_remove_pool_destroys_idle() {
    let (created, destroyed) = counters();
    let mut manager = PoolManager::new();
    manager
        .create_pool("enemies", tracked::<Enemy>(&created, &destroyed))
        .unwrap();
    manager.prewarm("enemies", 3).unwrap();

    assert!(manager.remove_pool("enemies"));
    assert_eq!(destroyed.load(Ordering::SeqCst), 3);
    assert!(!manager.has_pool("enemies"));
    assert!(!manager.remove_pool("enemies"));
}

#[test]
fn test_destroy_tears_down_everything() {
    let (created, destroyed) = counters();
    let mut manager = PoolManager::new();
    manager
        .create_pool("a", tracked::<Enemy>(&created, &destroyed))
        .unwrap();
    manager
        .create_pool("b", tracked::<u32>(&created, &destroyed))
        .unwrap();
    manager.prewarm("a", 2).unwrap();
    manager.prewarm("b", 2).unwrap();

    manager.destroy();
    assert!(manager.is_empty());
    assert_eq!(destroyed.load(Ordering::SeqCst), 4);
}

#[test]
fn test_drop_tears_down_everything() {
    let (created, destroyed) = counters();
    {
        let mut manager = PoolManager::new();
        manager
            .create_pool("a", tracked::<Enemy>(&created, &destroyed))
            .unwrap();
        manager.prewarm("a", 5).unwrap();
    }
    assert_eq!(destroyed.load(Ordering::SeqCst), 5);
}

#[test]
fn test_handle_shares_state_with_manager() {
    let mut manager = PoolManager::new();
    let pool = manager
        .create_pool("enemies", PoolCore::builder(Enemy::default))
        .unwrap();

    let enemy = pool.get().unwrap();
    manager.release("enemies", enemy).unwrap();
    assert_eq!(pool.len(), 1);
    assert_eq!(manager.keys().count(), 1);
}
