//! Ticket lifecycle tests
//!
//! Every policy shares the same lease/release contract: a ticket is honoured
//! once, by the allocator that issued it, and every failure is mirrored into
//! the last-error slot.

use pretty_assertions::assert_eq;
use rstest::rstest;
use valet_lease::{Allocator, Error, Policy, Pool};

#[derive(Debug, PartialEq, Eq)]
struct Car(u32);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

// ---------------------------------------------------------------------------
// Contract shared by all policies
// ---------------------------------------------------------------------------

#[rstest]
#[case::sequential(Policy::Sequential)]
#[case::most_available(Policy::MostAvailable)]
#[case::highest_rate(Policy::HighestAvailabilityRate)]
fn lease_then_release_returns_same_item(#[case] policy: Policy) {
    init_tracing();
    let pool = Pool::default();
    let allocator = Allocator::new(policy, [pool.clone()]);

    let ticket = allocator.lease(Car(1)).unwrap();
    assert_eq!(pool.available_count(), 9);

    assert_eq!(allocator.release(Some(&ticket)), Ok(Car(1)));
    assert_eq!(pool.available_count(), 10);
    assert_eq!(allocator.last_error_message(), None);
}

#[rstest]
#[case::sequential(Policy::Sequential)]
#[case::most_available(Policy::MostAvailable)]
#[case::highest_rate(Policy::HighestAvailabilityRate)]
fn multiple_items_come_back_by_ticket(#[case] policy: Policy) {
    init_tracing();
    let allocator = Allocator::new(policy, [Pool::default()]);
    let first = allocator.lease(Car(1)).unwrap();
    let second = allocator.lease(Car(2)).unwrap();

    assert_eq!(allocator.release(Some(&second)), Ok(Car(2)));
    assert_eq!(allocator.release(Some(&first)), Ok(Car(1)));
}

#[rstest]
#[case::sequential(Policy::Sequential)]
#[case::most_available(Policy::MostAvailable)]
#[case::highest_rate(Policy::HighestAvailabilityRate)]
fn ticket_is_single_use(#[case] policy: Policy) {
    init_tracing();
    let allocator = Allocator::new(policy, [Pool::default()]);
    let ticket = allocator.lease(Car(1)).unwrap();
    allocator.release(Some(&ticket)).unwrap();

    assert_eq!(
        allocator.release(Some(&ticket)),
        Err(Error::UnrecognizedTicket)
    );
    assert_eq!(
        allocator.last_error_message().as_deref(),
        Some("Unrecognized parking ticket.")
    );
}

#[rstest]
#[case::sequential(Policy::Sequential)]
#[case::most_available(Policy::MostAvailable)]
#[case::highest_rate(Policy::HighestAvailabilityRate)]
fn missing_ticket_is_reported(#[case] policy: Policy) {
    init_tracing();
    let allocator = Allocator::new(policy, [Pool::default()]);
    allocator.lease(Car(1)).unwrap();

    assert_eq!(allocator.release(None), Err(Error::MissingTicket));
    assert_eq!(
        allocator.last_error_message().as_deref(),
        Some("Please provide your parking ticket.")
    );
}

#[rstest]
#[case::sequential(Policy::Sequential)]
#[case::most_available(Policy::MostAvailable)]
#[case::highest_rate(Policy::HighestAvailabilityRate)]
fn full_pool_rejects_lease(#[case] policy: Policy) {
    init_tracing();
    let pool = Pool::new(1).unwrap();
    let allocator = Allocator::new(policy, [pool.clone()]);

    allocator.lease(Car(1)).unwrap();
    let err = allocator.lease(Car(2)).unwrap_err();

    assert_eq!(err, Error::CapacityExhausted);
    assert!(err.is_retryable());
    assert_eq!(
        allocator.last_error_message().as_deref(),
        Some("The parking lot is full.")
    );
    assert_eq!(pool.occupied_count(), 1);
}

// ---------------------------------------------------------------------------
// Wrong and foreign tickets
// ---------------------------------------------------------------------------

#[test]
fn ticket_from_another_pool_is_unrecognized() {
    init_tracing();
    let allocator = Allocator::sequential([Pool::default()]);
    allocator.lease(Car(1)).unwrap();
    let stranger = Pool::default().lease(Car(2));

    assert_eq!(
        allocator.release(Some(&stranger)),
        Err(Error::UnrecognizedTicket)
    );
    assert_eq!(allocator.outstanding(), 1);
}

#[test]
fn ticket_is_rejected_by_other_allocator_sharing_the_pool() {
    init_tracing();
    let shared = Pool::default();
    let issuer = Allocator::sequential([shared.clone()]);
    let other = Allocator::most_available([shared.clone()]);

    let ticket = issuer.lease(Car(7)).unwrap();

    assert_eq!(other.release(Some(&ticket)), Err(Error::UnrecognizedTicket));
    assert_eq!(shared.occupied_count(), 1);
    assert_eq!(issuer.release(Some(&ticket)), Ok(Car(7)));
}

#[test]
fn shared_pool_capacity_is_seen_by_every_allocator() {
    init_tracing();
    let shared = Pool::new(2).unwrap();
    let first = Allocator::sequential([shared.clone()]);
    let second = Allocator::highest_availability_rate([shared.clone()]);

    first.lease(Car(1)).unwrap();
    second.lease(Car(2)).unwrap();

    assert_eq!(first.lease(Car(3)), Err(Error::CapacityExhausted));
    assert_eq!(second.lease(Car(4)), Err(Error::CapacityExhausted));
}

#[test]
fn released_slot_can_be_leased_again() {
    init_tracing();
    let pool = Pool::new(1).unwrap();
    let allocator = Allocator::sequential([pool.clone()]);

    let ticket = allocator.lease(Car(1)).unwrap();
    assert!(allocator.lease(Car(2)).is_err());
    allocator.release(Some(&ticket)).unwrap();

    let again = allocator.lease(Car(3)).unwrap();
    assert_ne!(again, ticket);
    assert_eq!(pool.stats().total_leases, 2);
}
