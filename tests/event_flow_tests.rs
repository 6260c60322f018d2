mod common;

use calendar_skill::dialogs::DialogId;
use chrono::{TimeZone, Utc};
use common::*;

#[tokio::test]
async fn test_create_collects_slots_then_confirms() {
    let harness = Harness::new(MockCalendar::with_events(Vec::new()), MockAuthenticator::signed_in(), false);

    let replies = harness.say("schedule a meeting", at(8, 0)).await;
    assert!(texts(&replies).iter().any(|t| t.contains("What's the meeting about")));

    harness.say("Quarterly planning", at(8, 1)).await;

    let retry = harness.say("sometime soon", at(8, 2)).await;
    assert!(texts(&retry)[0].contains("didn't understand that time"));

    let past = harness.say("today at 7am", at(8, 2)).await;
    assert!(texts(&past)[0].contains("already passed"));

    harness.say("tomorrow at 3pm", at(8, 3)).await;
    harness.say("1 hour", at(8, 4)).await;

    let confirm = harness.say("ann@example.com, bob@example.com", at(8, 5)).await;
    let preview = event_cards(&confirm);
    assert_eq!(preview.len(), 1);
    assert_eq!(preview[0].title, "Quarterly planning");
    assert_eq!(preview[0].attendees.len(), 2);
    assert!(harness.calendar.calls().is_empty());

    let done = harness.say("yes", at(8, 6)).await;
    assert!(texts(&done).iter().any(|t| t.contains("Quarterly planning is on your calendar at 3:00 PM")));

    let start = Utc.with_ymd_and_hms(2026, 10, 17, 15, 0, 0).unwrap();
    match harness.calendar.calls().as_slice() {
        [CalendarCall::Create(created)] => {
            assert_eq!(created.start, start);
            assert_eq!(created.end, start + chrono::Duration::minutes(60));
            assert_eq!(created.attendees, vec!["ann@example.com", "bob@example.com"]);
        }
        calls => panic!("unexpected calls: {:?}", calls),
    }

    let state = harness.host.state(CONVERSATION).await.unwrap().unwrap();
    assert!(state.stack.is_empty());
    assert!(state.session.draft.is_none());
}

#[tokio::test]
async fn test_create_declined_changes_nothing() {
    let harness = Harness::new(MockCalendar::with_events(Vec::new()), MockAuthenticator::signed_in(), false);

    for answer in ["schedule a meeting", "Sync", "tomorrow at 10am", "30 min", "nobody"] {
        harness.say(answer, at(8, 0)).await;
    }

    let unclear = harness.say("hmm", at(8, 1)).await;
    assert!(texts(&unclear)[0].contains("yes or no"));

    let replies = harness.say("no", at(8, 2)).await;
    assert!(texts(&replies).iter().any(|t| t.contains("left your calendar as it was")));
    assert!(harness.calendar.calls().is_empty());
}

#[tokio::test]
async fn test_delete_picks_the_mentioned_meeting() {
    let harness = Harness::new(
        MockCalendar::with_events(vec![
            event("Standup", at(10, 0), 15),
            event("Planning", at(11, 0), 60),
        ]),
        MockAuthenticator::signed_in(),
        false,
    );

    let confirm = harness.say("cancel my standup", at(8, 0)).await;
    assert_eq!(event_cards(&confirm)[0].title, "Standup");
    assert!(texts(&confirm).iter().any(|t| t.contains("Delete Standup at 10:00 AM?")));

    let done = harness.say("yes", at(8, 1)).await;
    assert!(texts(&done).iter().any(|t| t.contains("Standup was deleted")));
    assert!(harness
        .calendar
        .calls()
        .contains(&CalendarCall::Delete("standup".to_string())));
    assert_eq!(harness.calendar.events().len(), 1);
}

#[tokio::test]
async fn test_delete_asks_which_meeting() {
    let harness = Harness::new(
        MockCalendar::with_events(vec![
            event("Standup", at(10, 0), 15),
            event("Planning", at(11, 0), 60),
        ]),
        MockAuthenticator::signed_in(),
        false,
    );

    let choose = harness.say("cancel my meeting", at(8, 0)).await;
    assert_eq!(
        meeting_lists(&choose),
        vec![vec!["Standup".to_string(), "Planning".to_string()]]
    );

    let retry = harness.say("the ninth", at(8, 1)).await;
    assert!(texts(&retry)[0].contains("couldn't find that one"));

    let confirm = harness.say("the second", at(8, 2)).await;
    assert_eq!(event_cards(&confirm)[0].title, "Planning");

    harness.say("yes", at(8, 3)).await;
    assert!(harness
        .calendar
        .calls()
        .contains(&CalendarCall::Delete("planning".to_string())));
}

#[tokio::test]
async fn test_delete_failure_is_a_fault() {
    let calendar = MockCalendar::with_events(vec![event("Standup", at(10, 0), 15)]);
    let harness = Harness::new(calendar, MockAuthenticator::signed_in(), false);

    harness.say("cancel my standup", at(8, 0)).await;
    harness.calendar.set_failing(true);
    let replies = harness.say("yes", at(8, 1)).await;

    assert!(texts(&replies).iter().any(|t| t.contains("something went wrong")));
    let state = harness.host.state(CONVERSATION).await.unwrap().unwrap();
    assert!(state.stack.is_empty());
    assert!(state.session.target_event.is_none());
}

#[tokio::test]
async fn test_update_moves_the_meeting() {
    let harness = Harness::new(
        MockCalendar::with_events(vec![event("Standup", at(10, 0), 15)]),
        MockAuthenticator::signed_in(),
        false,
    );

    let ask = harness.say("move my meeting", at(8, 0)).await;
    assert!(texts(&ask).iter().any(|t| t.contains("When should Standup start instead?")));

    let confirm = harness.say("14:00", at(8, 1)).await;
    assert!(texts(&confirm)[0].contains("Move Standup to 2:00 PM?"));

    let done = harness.say("yes", at(8, 2)).await;
    assert!(texts(&done).iter().any(|t| t.contains("Standup now starts at 2:00 PM")));
    assert_eq!(event_cards(&done)[0].end, at(14, 15));
    assert!(harness
        .calendar
        .calls()
        .contains(&CalendarCall::UpdateStart("standup".to_string(), at(14, 0))));
}

#[tokio::test]
async fn test_cancel_interrupts_a_mutation() {
    let harness = Harness::new(
        MockCalendar::with_events(vec![event("Standup", at(10, 0), 15)]),
        MockAuthenticator::signed_in(),
        false,
    );

    harness.say("move my meeting", at(8, 0)).await;
    let state = harness.host.state(CONVERSATION).await.unwrap().unwrap();
    assert_eq!(state.active_dialog(), Some(DialogId::UpdateEvent));

    harness.say("never mind", at(8, 1)).await;
    let state = harness.host.state(CONVERSATION).await.unwrap().unwrap();
    assert!(state.stack.is_empty());
    assert!(state.session.target_event.is_none());
    assert!(!harness
        .calendar
        .calls()
        .iter()
        .any(|call| matches!(call, CalendarCall::UpdateStart(..))));
}
