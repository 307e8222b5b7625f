use std::sync::Arc;

use poolkit::*;

#[derive(Debug, Default)]
struct Widget {
    label: String,
}

fn widget_builder() -> PoolBuilder<Widget> {
    PoolCore::builder(Widget::default).reset(|w: &mut Widget| w.label.clear())
}

#[test]
fn test_pool_for_template_deduplicates() {
    let template = TemplateId::from_name("ui/health_bar");
    let mut ctx = PoolContext::init();

    let first = ctx
        .pool_for_template(template, "hud", "health-bars", ["ui"], widget_builder())
        .unwrap();
    let second = ctx
        .pool_for_template(template, "hud", "other-name", ["ui"], widget_builder())
        .unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(ctx.manager().len(), 1);
    assert!(!ctx.manager().has_pool("other-name"));

    let entry = ctx
        .registry()
        .lookup(template, "hud")
        .expect("registration");
    assert_eq!(entry.pool_name(), "health-bars");
    assert!(entry.object_type().ends_with("Widget"));
    assert_eq!(ctx.registry().find_pools_by_tag("ui"), ["health-bars"]);
}

#[test]
fn test_separate_contexts_get_separate_pools() {
    let template = TemplateId::from_name("ui/tooltip");
    let mut ctx = PoolContext::init();

    let hud = ctx
        .pool_for_template(template, "hud", "hud-tooltips", ["ui"], widget_builder())
        .unwrap();
    let menu = ctx
        .pool_for_template(template, "menu", "menu-tooltips", ["ui"], widget_builder())
        .unwrap();

    assert!(!Arc::ptr_eq(&hud, &menu));
    assert_eq!(
        ctx.registry().find_pool_names_by_template(template),
        ["hud-tooltips", "menu-tooltips"]
    );
}

#[test]
fn test_remove_pool_clears_registrations() {
    let template = TemplateId::new(11);
    let mut ctx = PoolContext::init();
    ctx.pool_for_template(template, "hud", "widgets", ["ui"], widget_builder())
        .unwrap();

    assert!(ctx.remove_pool("widgets"));
    assert!(!ctx.manager().has_pool("widgets"));
    assert_eq!(ctx.registry().find_pool_name_by_template(template, None), None);
    assert!(ctx.registry().find_pools_by_tag("ui").is_empty());
}

#[test]
fn test_stale_registration_is_replaced() {
    let template = TemplateId::new(12);
    let mut ctx = PoolContext::init();
    let old = ctx
        .pool_for_template(template, "hud", "widgets", ["ui"], widget_builder())
        .unwrap();

    ctx.manager_mut().remove_pool("widgets");
    let new = ctx
        .pool_for_template(template, "hud", "widgets-v2", ["ui"], widget_builder())
        .unwrap();

    assert!(!Arc::ptr_eq(&old, &new));
    assert_eq!(
        ctx.registry().find_pool_name_by_template(template, Some("hud")),
        Some("widgets-v2")
    );
}

#[test]
fn test_pool_by_template() {
    let template = TemplateId::new(13);
    let mut ctx = PoolContext::init();
    assert!(matches!(
        ctx.pool_by_template::<Widget>(template, None),
        Err(PoolError::PoolNotFound(_))
    ));

    let pool = ctx
        .pool_for_template(template, "hud", "widgets", ["ui"], widget_builder())
        .unwrap();
    let found = ctx.pool_by_template::<Widget>(template, None).unwrap();
    assert!(Arc::ptr_eq(&pool, &found));
}

#[test]
fn test_teardown() {
    let mut ctx = PoolContext::init();
    let pool = ctx
        .pool_for_template(TemplateId::new(1), "hud", "widgets", ["ui"], widget_builder())
        .unwrap();
    pool.prewarm(3).unwrap();

    ctx.teardown();
    assert!(ctx.manager().is_empty());
    assert!(ctx.registry().is_empty());
    assert!(pool.is_empty());
}

#[test]
fn test_contexts_are_isolated() {
    let template = TemplateId::new(1);
    let mut a = PoolContext::init();
    let b = PoolContext::init();
    a.pool_for_template(template, "hud", "widgets", ["ui"], widget_builder())
        .unwrap();

    assert!(a.manager().has_pool("widgets"));
    assert!(!b.manager().has_pool("widgets"));
    assert!(b.registry().is_empty());
}
