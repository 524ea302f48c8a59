//! In-memory wiring of every service, used by the unit and request tests.

use std::sync::Arc;

use crate::modules::access::service::AccessPolicy;
use crate::modules::conversation::service::ConversationService;
use crate::modules::message::service::MessageService;
use crate::modules::reaction::service::ReactionService;
use crate::modules::user::service::UserService;


pub use memory::MemoryStore;

#[derive(Clone)]
pub struct Services {
    pub users: UserService,
    pub conversations: ConversationService,
    pub messages: MessageService,
    pub reactions: ReactionService,
    pub policy: AccessPolicy,
}

pub fn services(store: MemoryStore) -> Services {
    let store = Arc::new(store);

    let policy = AccessPolicy::with_dependencies(store.clone(), store.clone(), store.clone());

    Services {
        users: UserService::with_dependencies(store.clone(), store.clone()),
        conversations: ConversationService::with_dependencies(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            policy.clone(),
        ),
        messages: MessageService::with_dependencies(store.clone(), store.clone(), policy.clone()),
        reactions: ReactionService::with_dependencies(store.clone(), store, policy.clone()),
        policy,
    }
}

pub mod fixture {
    use super::Services;
    use crate::modules::user::model::UserResponse;

    pub async fn user(svc: &Services, username: &str) -> UserResponse {
        svc.users.login(username.to_string()).await.unwrap().user
    }

    pub async fn pair(svc: &Services) -> (UserResponse, UserResponse) {
        (user(svc, "alice").await, user(svc, "bob").await)
    }
}
