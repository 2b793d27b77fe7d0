//! Projection and sorting functions.

use mova_backend::Session;
use mova_core::{Order, OrderStatus, Role, UserId, UserProfile};
use serde::{Deserialize, Serialize};

/// Orders belonging to the actor.
///
/// Customer: orders they created. Executor: orders bound to them (pending,
/// confirmed, terminal); open orders are not "theirs" unless previously
/// assigned.
pub fn my_orders(actor: &Session, orders: &[Order]) -> Vec<Order> {
    orders
        .iter()
        .filter(|order| match actor.role {
            Role::Customer => order.customer_id == actor.user_id,
            Role::Executor => order.executor_id.as_ref() == Some(&actor.user_id),
            Role::Admin => true,
        })
        .cloned()
        .collect()
}

/// Open marketplace orders, visible to executors only.
pub fn open_orders(actor: &Session, orders: &[Order]) -> Vec<Order> {
    if actor.role != Role::Executor {
        return Vec::new();
    }
    orders
        .iter()
        .filter(|order| order.status == OrderStatus::Open)
        .cloned()
        .collect()
}

/// Executors visible to a customer.
///
/// An executor with an active subscription is invisible to everyone except
/// their own subscribed customer.
pub fn visible_executors(for_customer: &UserId, profiles: &[UserProfile]) -> Vec<UserProfile> {
    profiles
        .iter()
        .filter(|profile| profile.is_executor())
        .filter(|profile| {
            profile.subscription_status != mova_core::SubscriptionStatus::Active
                || profile.subscribed_to_customer_id.as_ref() == Some(for_customer)
        })
        .cloned()
        .collect()
}

/// Viewer-selectable ordering for the executor marketplace list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutorSort {
    /// Rating descending, reviews count descending on ties.
    #[default]
    Rating,
    /// Mean enabled-service price ascending; unpriced profiles last.
    Price,
}

/// Sort executors for the marketplace list.
///
/// Both orderings are stable: full ties keep the original list order.
pub fn sort_executors(mut executors: Vec<UserProfile>, sort: ExecutorSort) -> Vec<UserProfile> {
    match sort {
        ExecutorSort::Rating => {
            executors.sort_by(|a, b| {
                b.rating
                    .cmp(&a.rating)
                    .then(b.reviews_count.cmp(&a.reviews_count))
            });
        }
        ExecutorSort::Price => {
            executors.sort_by(|a, b| match (a.mean_enabled_price(), b.mean_enabled_price()) {
                (Some(a_price), Some(b_price)) => a_price.cmp(&b_price),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            });
        }
    }
    executors
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use mova_core::{
        Location, OrderLocation, ServiceKind, ServiceOffer, SubscriptionStatus,
    };
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn sample_order(customer: &str, executor: Option<&str>, status: OrderStatus) -> Order {
        let mut order = Order::new(
            UserId::from(customer),
            None,
            ServiceKind::Transfer,
            NaiveDate::from_ymd_opt(2026, 3, 14).unwrap(),
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            dec!(30),
            OrderLocation::Route {
                from: Location::from_address("A"),
                to: Location::from_address("B"),
            },
        )
        .unwrap();
        order.executor_id = executor.map(UserId::from);
        order.status = status;
        order
    }

    fn executor(id: &str, rating: Decimal, reviews_count: u32) -> UserProfile {
        let mut profile = UserProfile::new(UserId::from(id), Role::Executor, id);
        profile.rating = rating;
        profile.reviews_count = reviews_count;
        profile
    }

    fn session(user_id: &str, role: Role) -> Session {
        Session {
            user_id: UserId::from(user_id),
            role,
        }
    }

    #[test]
    fn test_my_orders_by_role() {
        let orders = vec![
            sample_order("cust-1", None, OrderStatus::Open),
            sample_order("cust-1", Some("exec-1"), OrderStatus::Confirmed),
            sample_order("cust-2", Some("exec-1"), OrderStatus::Completed),
            sample_order("cust-2", Some("exec-2"), OrderStatus::Confirmed),
        ];

        let mine = my_orders(&session("cust-1", Role::Customer), &orders);
        assert_eq!(mine.len(), 2);

        // Executor sees assigned orders, not unassigned open ones.
        let assigned = my_orders(&session("exec-1", Role::Executor), &orders);
        assert_eq!(assigned.len(), 2);
        assert!(assigned.iter().all(|o| o.executor_id == Some(UserId::from("exec-1"))));
    }

    #[test]
    fn test_open_orders_executor_only() {
        let orders = vec![
            sample_order("cust-1", None, OrderStatus::Open),
            sample_order("cust-2", Some("exec-1"), OrderStatus::Confirmed),
        ];

        assert_eq!(open_orders(&session("exec-1", Role::Executor), &orders).len(), 1);
        assert!(open_orders(&session("cust-1", Role::Customer), &orders).is_empty());
    }

    #[test]
    fn test_visibility_invariant() {
        let free = executor("exec-free", dec!(4), 2);

        let mut mine = executor("exec-mine", dec!(5), 10);
        mine.subscription_status = SubscriptionStatus::Active;
        mine.subscribed_to_customer_id = Some(UserId::from("cust-1"));

        let mut taken = executor("exec-taken", dec!(5), 10);
        taken.subscription_status = SubscriptionStatus::Active;
        taken.subscribed_to_customer_id = Some(UserId::from("cust-2"));

        let customer = UserProfile::new(UserId::from("cust-1"), Role::Customer, "Sam");

        let profiles = vec![free.clone(), mine.clone(), taken.clone(), customer];
        let visible = visible_executors(&UserId::from("cust-1"), &profiles);

        let ids: Vec<&str> = visible.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["exec-free", "exec-mine"]);

        // A pending or expired subscription does not hide anyone.
        let mut pending = executor("exec-pending", dec!(3), 1);
        pending.subscription_status = SubscriptionStatus::Pending;
        let visible = visible_executors(&UserId::from("cust-2"), &[pending]);
        assert_eq!(visible.len(), 1);
    }

    #[test]
    fn test_sort_by_rating_with_tiebreak() {
        let list = vec![
            executor("a", dec!(4), 3),
            executor("b", dec!(5), 1),
            executor("c", dec!(5), 7),
        ];
        let sorted = sort_executors(list, ExecutorSort::Rating);
        let ids: Vec<&str> = sorted.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_sort_by_rating_is_stable_on_full_ties() {
        let list = vec![
            executor("first", dec!(4), 2),
            executor("second", dec!(4), 2),
            executor("third", dec!(4), 2),
        ];
        let sorted = sort_executors(list, ExecutorSort::Rating);
        let ids: Vec<&str> = sorted.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_sort_by_price_unpriced_last() {
        let offer = |price: Decimal| ServiceOffer {
            service_id: "transfer".to_string(),
            price,
            enabled: true,
        };

        let mut cheap = executor("cheap", dec!(3), 0);
        cheap.custom_services = vec![offer(dec!(20))];
        let mut dear = executor("dear", dec!(5), 0);
        dear.custom_services = vec![offer(dec!(80))];
        // Zero-price offers count as unset.
        let mut unpriced = executor("unpriced", dec!(5), 0);
        unpriced.custom_services = vec![offer(Decimal::ZERO)];

        let sorted = sort_executors(vec![dear, unpriced, cheap], ExecutorSort::Price);
        let ids: Vec<&str> = sorted.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["cheap", "dear", "unpriced"]);
    }
}
