//! Root-level handlers for events neither region consumed.

use super::actions::Action;
use super::event::Event;

pub fn on_event(event: &Event) -> Option<Vec<Action>> {
    let actions = match event {
        Event::Load { force_goto, .. } => {
            let mut actions = vec![Action::RequestPreload];
            if *force_goto {
                actions.push(Action::MarkRetry);
            }
            actions
        }
        Event::Preload(_) => vec![Action::Hydrate, Action::RaiseGenerate { goto: true }],
        Event::Update => vec![Action::RefreshPools, Action::RaiseUpdate],
        Event::Launch { .. } => vec![Action::RegisterChild],
        Event::ChildUpdate { .. } => vec![Action::UpdateChild],
        Event::Kill { .. } => vec![Action::RemoveChild],
        Event::Destroy { .. } => vec![Action::DestroyChildren],
        Event::EnableNav => vec![Action::SetChildNav(false)],
        Event::DisableNav => vec![Action::SetChildNav(true)],
        Event::Send { .. } => vec![Action::SelfDisableNav, Action::RelayAnswer],
        Event::SendReply { .. } => vec![
            Action::RespondSend,
            Action::UpdateAnswered,
            Action::SelfEnableNav,
            Action::UpdateBundle,
            Action::RaiseGenerate { goto: false },
        ],
        Event::Expire => vec![
            Action::MarkExpired,
            Action::BroadcastTimeout,
            Action::RaiseFinalExit,
        ],
        _ => return None,
    };
    Some(actions)
}
