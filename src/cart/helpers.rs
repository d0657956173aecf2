//! Shopping Cart Business Logic Helpers
//!
//! Pure functions over [`CartState`]: line merging with stock clamps, removal,
//! quantity updates and the pricing rules. The store wraps these with
//! persistence; everything here is side-effect free.

use super::models::{
    CartState, CartSummary, Coupon, CouponType, LineItem, Product, StockCheck, DEFAULT_MAX_STOCK,
    DEFAULT_UNIT_PRICE,
};

/// Resolves `(unit_price, max_stock)` for a size of `product`.
///
/// Missing variants and missing fields fall back to [`DEFAULT_UNIT_PRICE`]
/// and [`DEFAULT_MAX_STOCK`].
pub fn resolve_variant(product: &Product, selected_size: &str) -> (f64, u32) {
    resolve_variant_or(product, selected_size, DEFAULT_UNIT_PRICE, DEFAULT_MAX_STOCK)
}

/// Same as [`resolve_variant`] with explicit fallbacks.
pub fn resolve_variant_or(
    product: &Product,
    selected_size: &str,
    default_price: f64,
    default_stock: u32,
) -> (f64, u32) {
    match product.variant(selected_size) {
        Some(variant) => (
            variant.price.unwrap_or(default_price),
            variant.stock.unwrap_or(default_stock),
        ),
        None => (default_price, default_stock),
    }
}

/// Clamps a requested quantity into `[1, max_stock]`.
///
/// `max_stock` must be at least 1.
pub fn clamp_quantity(requested: u64, max_stock: u32) -> u32 {
    let max_stock = max_stock.max(1);
    requested.clamp(1, u64::from(max_stock)) as u32
}

/// Merges `quantity` units of `(product, selected_size)` into the cart.
///
/// # Behaviour
///
/// * An existing line with the same key grows to
///   `min(existing + quantity, max_stock)`.
/// * Otherwise a new line is appended with `min(quantity, max_stock)`.
/// * A zero quantity or a variant with no stock leaves the cart untouched.
///
/// Returns whether the cart changed.
pub fn add_line_item(
    state: &mut CartState,
    product: &Product,
    selected_size: &str,
    quantity: u32,
) -> bool {
    let (unit_price, max_stock) = resolve_variant(product, selected_size);
    if quantity == 0 || max_stock == 0 {
        return false;
    }

    if let Some(existing) = state
        .items
        .iter_mut()
        .find(|i| i.matches(&product.id, selected_size))
    {
        let merged = u64::from(existing.quantity) + u64::from(quantity);
        let next = clamp_quantity(merged, max_stock);
        let changed = next != existing.quantity || existing.max_stock != max_stock;
        existing.quantity = next;
        existing.max_stock = max_stock;
        return changed;
    }

    state.items.push(LineItem {
        product_id: product.id.clone(),
        name: product.name.clone(),
        image: product.image.clone(),
        category: product.category.clone(),
        selected_size: selected_size.to_string(),
        unit_price,
        quantity: clamp_quantity(u64::from(quantity), max_stock),
        max_stock,
    });
    true
}

/// Drops the line identified by `(product_id, selected_size)`.
///
/// Returns whether a line was removed; an absent key is not an error.
pub fn remove_line_item(state: &mut CartState, product_id: &str, selected_size: &str) -> bool {
    let before = state.items.len();
    state.items.retain(|i| !i.matches(product_id, selected_size));
    state.items.len() != before
}

/// Sets the quantity of an existing line.
///
/// A quantity of zero or below removes the line. Otherwise the quantity is
/// clamped to `max_stock`, or to the stock recorded on the line when the
/// caller has none. Returns whether the cart changed.
pub fn set_line_quantity(
    state: &mut CartState,
    product_id: &str,
    selected_size: &str,
    new_quantity: i64,
    max_stock: Option<u32>,
) -> bool {
    if new_quantity <= 0 {
        return remove_line_item(state, product_id, selected_size);
    }

    let Some(index) = state
        .items
        .iter()
        .position(|i| i.matches(product_id, selected_size))
    else {
        return false;
    };

    let ceiling = max_stock.unwrap_or(state.items[index].max_stock);
    if ceiling == 0 {
        state.items.remove(index);
        return true;
    }

    let item = &mut state.items[index];
    let next = clamp_quantity(new_quantity as u64, ceiling);
    let changed = next != item.quantity || item.max_stock != ceiling;
    item.quantity = next;
    item.max_stock = ceiling;
    changed
}

/// Re-establishes the line invariants on a state read from outside.
///
/// Lines without stock or quantity are dropped, lines sharing a key are merged
/// into the first one (the later line's stock wins) and every quantity is
/// clamped to its line's stock. Returns whether anything was fixed up.
pub fn normalize_lines(state: &mut CartState) -> bool {
    let original = std::mem::take(&mut state.items);
    let mut lines: Vec<LineItem> = Vec::with_capacity(original.len());
    for line in original.iter().cloned() {
        if line.quantity == 0 || line.max_stock == 0 {
            continue;
        }
        match lines
            .iter_mut()
            .find(|l| l.matches(&line.product_id, &line.selected_size))
        {
            Some(existing) => {
                existing.quantity = existing.quantity.saturating_add(line.quantity);
                existing.max_stock = line.max_stock;
            }
            None => lines.push(line),
        }
    }
    for line in &mut lines {
        line.quantity = clamp_quantity(u64::from(line.quantity), line.max_stock);
    }

    let changed = lines != original;
    state.items = lines;
    changed
}

/// Takes `quantity` units off an existing line, dropping it when nothing is
/// left. Returns whether the cart changed.
pub fn deduct_line_quantity(
    state: &mut CartState,
    product_id: &str,
    selected_size: &str,
    quantity: u32,
) -> bool {
    let Some(index) = state
        .items
        .iter()
        .position(|i| i.matches(product_id, selected_size))
    else {
        return false;
    };
    if quantity == 0 {
        return false;
    }

    match state.items[index].quantity.checked_sub(quantity) {
        Some(remaining) if remaining > 0 => state.items[index].quantity = remaining,
        _ => {
            state.items.remove(index);
        }
    }
    true
}

/// `Σ unit_price × quantity`
pub fn subtotal(items: &[LineItem]) -> f64 {
    items.iter().map(LineItem::line_total).sum()
}

/// Subtotal restricted to items of `category`
pub fn category_subtotal(items: &[LineItem], category: &str) -> f64 {
    items
        .iter()
        .filter(|i| i.category.as_deref() == Some(category))
        .map(LineItem::line_total)
        .sum()
}

/// Discount granted by `coupon` on `items`.
///
/// Only percentage coupons discount anything. The percentage is clamped to
/// `[0, 100]` so the discount never exceeds the discounted base.
pub fn coupon_discount(items: &[LineItem], coupon: &Coupon) -> f64 {
    if coupon.coupon_type != CouponType::Percentage || !coupon.discount.is_finite() {
        return 0.0;
    }

    let base = match coupon.category.as_deref() {
        Some(category) => category_subtotal(items, category),
        None => subtotal(items),
    };
    base * coupon.discount.clamp(0.0, 100.0) / 100.0
}

/// Subtotal minus the discount of the applied coupon, if any
pub fn cart_total(state: &CartState) -> f64 {
    let subtotal = subtotal(&state.items);
    match &state.applied_coupon {
        Some(coupon) => subtotal - coupon_discount(&state.items, coupon),
        None => subtotal,
    }
}

/// Sum of quantities over all lines
pub fn cart_count(items: &[LineItem]) -> u32 {
    items.iter().map(|i| i.quantity).sum()
}

pub fn summarize(state: &CartState) -> CartSummary {
    let subtotal = subtotal(&state.items);
    let total = cart_total(state);
    CartSummary {
        subtotal,
        discount: subtotal - total,
        total,
        item_count: cart_count(&state.items),
        line_count: state.items.len(),
    }
}

/// Classifies a request against the stock of the chosen variant.
pub fn stock_check(product: &Product, selected_size: &str, quantity: u32) -> StockCheck {
    let (_, max_stock) = resolve_variant(product, selected_size);
    if max_stock == 0 {
        StockCheck::OutOfStock
    } else if quantity > max_stock {
        StockCheck::Limited { max: max_stock }
    } else {
        StockCheck::Available
    }
}

/// Trims and uppercases a user-entered code; blank codes yield `None`.
pub fn normalize_coupon_code(code: &str) -> Option<String> {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_uppercase())
    }
}

/// Produces a human-readable one-line summary for a list of cart items.
///
/// Example output: `"2x Makhana (100g), 1x Chips (50g)"`.
pub fn format_item_summary(items: &[LineItem]) -> String {
    items
        .iter()
        .map(|i| format!("{}x {} ({})", i.quantity, i.name, i.selected_size))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::models::SizeVariant;
    use std::collections::HashMap;

    fn product(id: &str, category: &str, sizes: &[(&str, Option<f64>, Option<u32>)]) -> Product {
        Product {
            id: id.into(),
            name: format!("Product {id}"),
            image: None,
            category: Some(category.into()),
            sizes: sizes
                .iter()
                .map(|(size, price, stock)| SizeVariant {
                    size: (*size).into(),
                    price: *price,
                    stock: *stock,
                })
                .collect(),
        }
    }

    fn percentage(discount: f64, category: Option<&str>) -> Coupon {
        Coupon {
            code: "TEST".into(),
            coupon_type: CouponType::Percentage,
            discount,
            category: category.map(Into::into),
            discount_amount: None,
            extra: HashMap::new(),
        }
    }

    #[test]
    fn test_add_merges_same_key_and_clamps_to_stock() {
        let mut state = CartState::default();
        let p = product("p1", "makhana", &[("100g", Some(150.0), Some(5))]);

        assert!(add_line_item(&mut state, &p, "100g", 3));
        assert!(add_line_item(&mut state, &p, "100g", 4));

        assert_eq!(state.items.len(), 1, "same key must not create a second line");
        assert_eq!(state.items[0].quantity, 5);
        assert_eq!(state.items[0].max_stock, 5);
    }

    #[test]
    fn test_add_distinct_sizes_are_distinct_lines() {
        let mut state = CartState::default();
        let p = product(
            "p1",
            "makhana",
            &[("100g", Some(150.0), Some(5)), ("250g", Some(320.0), Some(2))],
        );

        add_line_item(&mut state, &p, "100g", 1);
        add_line_item(&mut state, &p, "250g", 9);

        assert_eq!(state.items.len(), 2);
        assert_eq!(state.items[1].quantity, 2);
        assert_eq!(state.items[1].unit_price, 320.0);
    }

    #[test]
    fn test_add_unknown_size_uses_defaults() {
        let mut state = CartState::default();
        let p = product("p1", "chips", &[("50g", Some(40.0), Some(3))]);

        add_line_item(&mut state, &p, "family-pack", 150);

        let item = &state.items[0];
        assert_eq!(item.unit_price, DEFAULT_UNIT_PRICE);
        assert_eq!(item.max_stock, DEFAULT_MAX_STOCK);
        assert_eq!(item.quantity, DEFAULT_MAX_STOCK);
    }

    #[test]
    fn test_resolve_variant_or_explicit_fallbacks() {
        let p = product("p1", "chips", &[("50g", None, None)]);
        assert_eq!(resolve_variant_or(&p, "50g", 12.5, 7), (12.5, 7));
        assert_eq!(resolve_variant_or(&p, "missing", 1.0, 2), (1.0, 2));
    }

    #[test]
    fn test_add_out_of_stock_or_zero_is_noop() {
        let mut state = CartState::default();
        let p = product("p1", "chips", &[("50g", Some(40.0), Some(0))]);

        assert!(!add_line_item(&mut state, &p, "50g", 2));
        let q = product("p2", "chips", &[("50g", Some(40.0), Some(4))]);
        assert!(!add_line_item(&mut state, &q, "50g", 0));

        assert!(state.items.is_empty());
    }

    #[test]
    fn test_remove_absent_key_leaves_state_unchanged() {
        let mut state = CartState::default();
        let p = product("p1", "chips", &[("50g", Some(40.0), Some(4))]);
        add_line_item(&mut state, &p, "50g", 1);
        let before = state.clone();

        assert!(!remove_line_item(&mut state, "p1", "100g"));
        assert!(!remove_line_item(&mut state, "nope", "50g"));
        assert_eq!(state, before);
    }

    #[test]
    fn test_set_quantity_clamps_and_removes() {
        let mut state = CartState::default();
        let p = product("p1", "chips", &[("50g", Some(40.0), Some(4))]);
        add_line_item(&mut state, &p, "50g", 1);

        set_line_quantity(&mut state, "p1", "50g", 10, Some(5));
        assert_eq!(state.items[0].quantity, 5);

        // Falls back to the stock recorded on the line.
        set_line_quantity(&mut state, "p1", "50g", 10, None);
        assert_eq!(state.items[0].quantity, 5);

        set_line_quantity(&mut state, "p1", "50g", 0, Some(5));
        assert!(state.items.is_empty());
    }

    #[test]
    fn test_set_quantity_absent_item_is_noop() {
        let mut state = CartState::default();
        assert!(!set_line_quantity(&mut state, "p1", "50g", 3, Some(5)));
        assert!(state.items.is_empty());
    }

    fn line(id: &str, size: &str, quantity: u32, max_stock: u32) -> LineItem {
        LineItem {
            product_id: id.into(),
            name: format!("Product {id}"),
            image: None,
            category: None,
            selected_size: size.into(),
            unit_price: 100.0,
            quantity,
            max_stock,
        }
    }

    #[test]
    fn test_normalize_lines_repairs_stored_state() {
        let mut state = CartState {
            items: vec![
                line("P", "100g", 0, 0),
                line("C", "50g", 40, 5),
                line("C", "50g", 2, 5),
                line("R", "1kg", 0, 9),
            ],
            applied_coupon: None,
        };

        assert!(normalize_lines(&mut state));
        assert_eq!(state.items, vec![line("C", "50g", 5, 5)]);
        assert_eq!(cart_count(&state.items), 5);
        assert_eq!(subtotal(&state.items), 500.0);
    }

    #[test]
    fn test_normalize_lines_leaves_valid_state() {
        let mut state = CartState {
            items: vec![line("P", "100g", 2, 5), line("P", "250g", 1, 1)],
            applied_coupon: None,
        };
        let before = state.clone();

        assert!(!normalize_lines(&mut state));
        assert_eq!(state, before);
    }

    #[test]
    fn test_deduct_line_quantity() {
        let mut state = CartState {
            items: vec![line("P", "100g", 5, 9), line("C", "50g", 2, 9)],
            applied_coupon: None,
        };

        assert!(deduct_line_quantity(&mut state, "P", "100g", 3));
        assert_eq!(state.items[0].quantity, 2);

        assert!(deduct_line_quantity(&mut state, "C", "50g", 4));
        assert!(!deduct_line_quantity(&mut state, "C", "50g", 1));
        assert_eq!(state.items, vec![line("P", "100g", 2, 9)]);
    }

    #[test]
    fn test_clamp_invariant_over_mixed_operations() {
        let mut state = CartState::default();
        let p = product("p1", "chips", &[("50g", Some(40.0), Some(3)), ("1kg", None, None)]);

        for q in [1, 2, 7, 100, 1] {
            add_line_item(&mut state, &p, "50g", q);
            add_line_item(&mut state, &p, "1kg", q);
        }
        for q in [-3, 0, 1, 1000] {
            set_line_quantity(&mut state, "p1", "1kg", q, None);
            add_line_item(&mut state, &p, "1kg", 1);
        }

        for item in &state.items {
            assert!(item.quantity >= 1 && item.quantity <= item.max_stock, "{item:?}");
        }
    }

    #[test]
    fn test_total_without_coupon_is_subtotal() {
        let mut state = CartState::default();
        add_line_item(&mut state, &product("a", "x", &[("s", Some(12.5), None)]), "s", 4);
        add_line_item(&mut state, &product("b", "y", &[("s", Some(3.0), None)]), "s", 3);

        assert_eq!(cart_total(&state), 59.0);
        assert_eq!(cart_count(&state.items), 7);
    }

    #[test]
    fn test_store_wide_percentage_coupon() {
        let mut state = CartState::default();
        add_line_item(&mut state, &product("a", "x", &[("s", Some(120.0), None)]), "s", 2);
        add_line_item(&mut state, &product("b", "y", &[("s", Some(35.0), None)]), "s", 1);
        state.applied_coupon = Some(percentage(10.0, None));

        let expected = 275.0 * 0.9;
        assert!((cart_total(&state) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_category_scoped_coupon_discounts_only_category() {
        let mut state = CartState::default();
        add_line_item(&mut state, &product("m", "makhana", &[("s", Some(100.0), None)]), "s", 1);
        add_line_item(&mut state, &product("c", "chips", &[("s", Some(100.0), None)]), "s", 1);
        state.applied_coupon = Some(percentage(20.0, Some("makhana")));

        assert_eq!(cart_total(&state), 180.0);

        let summary = summarize(&state);
        assert_eq!(summary.subtotal, 200.0);
        assert_eq!(summary.discount, 20.0);
        assert_eq!(summary.line_count, 2);
    }

    #[test]
    fn test_non_percentage_coupon_leaves_total() {
        let mut state = CartState::default();
        add_line_item(&mut state, &product("a", "x", &[("s", Some(50.0), None)]), "s", 2);
        let mut coupon = percentage(30.0, None);
        coupon.coupon_type = CouponType::Fixed;
        state.applied_coupon = Some(coupon);

        assert_eq!(cart_total(&state), 100.0);
    }

    #[test]
    fn test_oversized_percentage_never_goes_negative() {
        let mut state = CartState::default();
        add_line_item(&mut state, &product("a", "x", &[("s", Some(50.0), None)]), "s", 2);
        state.applied_coupon = Some(percentage(250.0, None));
        assert_eq!(cart_total(&state), 0.0);

        state.applied_coupon = Some(percentage(-40.0, None));
        assert_eq!(cart_total(&state), 100.0);
    }

    #[test]
    fn test_stock_check() {
        let p = product("p", "x", &[("a", Some(1.0), Some(0)), ("b", Some(1.0), Some(4))]);
        assert_eq!(stock_check(&p, "a", 1), StockCheck::OutOfStock);
        assert_eq!(stock_check(&p, "b", 5), StockCheck::Limited { max: 4 });
        assert_eq!(stock_check(&p, "b", 4), StockCheck::Available);
        assert_eq!(stock_check(&p, "unknown", 99), StockCheck::Available);
    }

    #[test]
    fn test_normalize_coupon_code() {
        assert_eq!(normalize_coupon_code("  vibe10 "), Some("VIBE10".to_string()));
        assert_eq!(normalize_coupon_code("   "), None);
    }

    #[test]
    fn test_format_item_summary() {
        let mut state = CartState::default();
        add_line_item(&mut state, &product("a", "x", &[("100g", Some(1.0), None)]), "100g", 2);
        add_line_item(&mut state, &product("b", "y", &[("50g", Some(1.0), None)]), "50g", 1);

        assert_eq!(
            format_item_summary(&state.items),
            "2x Product a (100g), 1x Product b (50g)"
        );
    }
}
