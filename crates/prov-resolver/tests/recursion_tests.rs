use super::*;

#[test]
fn profile_limits_come_from_shared_constants() {
    assert_eq!(RecursionProfile::Resolve.max_depth(), MAX_RESOLVE_DEPTH);
    assert_eq!(RecursionProfile::Resolve.max_iterations(), MAX_RESOLVE_ITERATIONS);
    assert_eq!(RecursionProfile::Shallow.max_depth(), SHALLOW_RESOLVE_DEPTH);
    let custom = RecursionProfile::Custom {
        max_depth: 3,
        max_iterations: 9,
    };
    assert_eq!(custom.max_depth(), 3);
    assert_eq!(custom.max_iterations(), 9);
    assert_eq!(RecursionProfile::default(), RecursionProfile::Resolve);
}

#[test]
fn enter_leave_tracks_depth() {
    let mut guard = RecursionGuard::<u32>::with_profile(RecursionProfile::Resolve);
    assert!(guard.enter(1).is_entered());
    assert!(guard.enter(2).is_entered());
    assert_eq!(guard.depth(), 2);
    assert!(guard.is_open(&1));
    guard.leave(2);
    guard.leave(1);
    assert_eq!(guard.depth(), 0);
    assert!(!guard.is_active());
    assert_eq!(guard.iterations(), 2);
}

#[test]
fn reentering_an_open_key_is_a_cycle() {
    let mut guard = RecursionGuard::<u32>::new(10, 100);
    assert!(guard.enter(7).is_entered());
    let result = guard.enter(7);
    assert!(result.is_cycle());
    assert!(result.is_denied());
    assert!(!result.is_exceeded());
    assert!(!guard.is_exceeded());
    guard.leave(7);
}

#[test]
fn released_key_can_be_entered_again() {
    let mut guard = RecursionGuard::<u32>::new(10, 100);
    assert!(guard.enter(7).is_entered());
    guard.leave(7);
    assert!(guard.enter(7).is_entered());
    guard.leave(7);
}

#[test]
fn depth_limit_denies_and_sticks() {
    let mut guard = RecursionGuard::<u32>::new(2, 100);
    assert!(guard.enter(1).is_entered());
    assert!(guard.enter(2).is_entered());
    assert_eq!(guard.enter(3), RecursionResult::DepthExceeded);
    assert!(guard.is_exceeded());
    guard.leave(2);
    guard.leave(1);
    assert!(guard.is_exceeded());
}

#[test]
fn iteration_budget_counts_denied_attempts() {
    let mut guard = RecursionGuard::<u32>::new(10, 3);
    assert!(guard.enter(1).is_entered());
    assert!(guard.enter(1).is_cycle());
    guard.leave(1);
    assert!(guard.enter(2).is_entered());
    guard.leave(2);
    assert_eq!(guard.enter(3), RecursionResult::IterationExceeded);
}

#[test]
fn open_limit_reports_depth_exceeded() {
    let mut guard = RecursionGuard::<u32>::new(100, 100).with_open_limit(1);
    assert!(guard.enter(1).is_entered());
    assert_eq!(guard.enter(2), RecursionResult::DepthExceeded);
    guard.leave(1);
}

#[test]
fn reset_clears_open_entries() {
    let mut guard = RecursionGuard::<u32>::new(1, 100);
    assert!(guard.enter(1).is_entered());
    assert!(guard.enter(2).is_exceeded());
    guard.reset();
    assert_eq!(guard.depth(), 0);
    assert_eq!(guard.iterations(), 0);
    assert!(!guard.is_exceeded());
    assert!(!guard.is_open(&1));
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "open entries")]
fn dropping_with_open_entries_panics_in_debug() {
    let mut guard = RecursionGuard::<u32>::new(10, 100);
    let _ = guard.enter(1);
    drop(guard);
}
