//! In-memory identity store for tests and single-process development.
//!
//! All maps sit behind one `RwLock`, so every multi-key write is atomic with
//! respect to every reader. Nothing survives a restart.

use async_trait::async_trait;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::domain::foundation::{ChatHandle, ClassName, MessageRef, Username};
use crate::ports::{IdentityStore, StoreError};

#[derive(Debug, Default)]
struct Maps {
    username_to_ids: HashMap<Username, ChatHandle>,
    students_to_class: HashMap<Username, ClassName>,
    teacher_to_class: HashMap<ChatHandle, ClassName>,
    class_to_teacher: HashMap<ClassName, ChatHandle>,
    class_to_message_id: HashMap<ClassName, MessageRef>,
    session_acks: HashMap<ClassName, BTreeSet<Username>>,
}

/// In-memory identity store.
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    maps: RwLock<Maps>,
    closed: AtomicBool,
}

impl InMemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::unavailable("identity store is closed"));
        }
        Ok(())
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn register(&self, username: &Username, handle: ChatHandle) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.maps
            .write()
            .await
            .username_to_ids
            .insert(username.clone(), handle);
        Ok(())
    }

    async fn lookup_chat_handle(
        &self,
        username: &Username,
    ) -> Result<Option<ChatHandle>, StoreError> {
        self.ensure_open()?;
        Ok(self.maps.read().await.username_to_ids.get(username).copied())
    }

    async fn set_student_classes(
        &self,
        enrollments: &[(Username, ClassName)],
    ) -> Result<(), StoreError> {
        self.ensure_open()?;
        let mut maps = self.maps.write().await;
        for (username, class) in enrollments {
            maps.students_to_class.insert(username.clone(), class.clone());
        }
        Ok(())
    }

    async fn get_student_class(
        &self,
        username: &Username,
    ) -> Result<Option<ClassName>, StoreError> {
        self.ensure_open()?;
        Ok(self.maps.read().await.students_to_class.get(username).cloned())
    }

    async fn set_active_class(
        &self,
        teacher: ChatHandle,
        class: &ClassName,
    ) -> Result<(), StoreError> {
        self.ensure_open()?;
        let mut maps = self.maps.write().await;
        maps.teacher_to_class.insert(teacher, class.clone());
        maps.class_to_teacher.insert(class.clone(), teacher);
        Ok(())
    }

    async fn get_active_class(&self, teacher: ChatHandle) -> Result<Option<ClassName>, StoreError> {
        self.ensure_open()?;
        Ok(self.maps.read().await.teacher_to_class.get(&teacher).cloned())
    }

    async fn get_active_teacher(
        &self,
        class: &ClassName,
    ) -> Result<Option<ChatHandle>, StoreError> {
        self.ensure_open()?;
        Ok(self.maps.read().await.class_to_teacher.get(class).copied())
    }

    async fn set_session_message(
        &self,
        class: &ClassName,
        message: MessageRef,
    ) -> Result<(), StoreError> {
        self.ensure_open()?;
        let mut maps = self.maps.write().await;
        maps.class_to_message_id.insert(class.clone(), message);
        maps.session_acks.remove(class);
        Ok(())
    }

    async fn get_session_message(
        &self,
        class: &ClassName,
    ) -> Result<Option<MessageRef>, StoreError> {
        self.ensure_open()?;
        Ok(self.maps.read().await.class_to_message_id.get(class).copied())
    }

    async fn open_session(
        &self,
        teacher: ChatHandle,
        class: &ClassName,
        message: MessageRef,
    ) -> Result<(), StoreError> {
        self.ensure_open()?;
        let mut maps = self.maps.write().await;
        maps.teacher_to_class.insert(teacher, class.clone());
        maps.class_to_teacher.insert(class.clone(), teacher);
        maps.class_to_message_id.insert(class.clone(), message);
        maps.session_acks.remove(class);
        Ok(())
    }

    async fn record_acknowledgement(
        &self,
        class: &ClassName,
        username: &Username,
    ) -> Result<bool, StoreError> {
        self.ensure_open()?;
        let mut maps = self.maps.write().await;
        Ok(maps
            .session_acks
            .entry(class.clone())
            .or_default()
            .insert(username.clone()))
    }

    async fn acknowledged_students(
        &self,
        class: &ClassName,
    ) -> Result<BTreeSet<Username>, StoreError> {
        self.ensure_open()?;
        Ok(self
            .maps
            .read()
            .await
            .session_acks
            .get(class)
            .cloned()
            .unwrap_or_default())
    }

    async fn close_session(
        &self,
        teacher: ChatHandle,
        class: &ClassName,
    ) -> Result<(), StoreError> {
        self.ensure_open()?;
        let mut maps = self.maps.write().await;
        maps.teacher_to_class.remove(&teacher);
        maps.class_to_teacher.remove(class);
        maps.class_to_message_id.remove(class);
        maps.session_acks.remove(class);
        Ok(())
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn user(name: &str) -> Username {
        Username::new(name).unwrap()
    }

    fn class(name: &str) -> ClassName {
        ClassName::new(name).unwrap()
    }

    #[tokio::test]
    async fn unregistered_user_is_not_found() {
        let store = InMemoryIdentityStore::new();
        assert_eq!(store.lookup_chat_handle(&user("ghost")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn register_overwrites_previous_handle() {
        let store = InMemoryIdentityStore::new();
        store.register(&user("alice_u"), ChatHandle::new(1)).await.unwrap();
        store.register(&user("alice_u"), ChatHandle::new(2)).await.unwrap();
        assert_eq!(
            store.lookup_chat_handle(&user("alice_u")).await.unwrap(),
            Some(ChatHandle::new(2))
        );
    }

    #[tokio::test]
    async fn active_class_is_bidirectional() {
        let store = InMemoryIdentityStore::new();
        let teacher = ChatHandle::new(100);
        store.set_active_class(teacher, &class("10A")).await.unwrap();

        assert_eq!(store.get_active_class(teacher).await.unwrap(), Some(class("10A")));
        assert_eq!(store.get_active_teacher(&class("10A")).await.unwrap(), Some(teacher));
    }

    #[tokio::test]
    async fn switching_class_is_last_write_wins() {
        let store = InMemoryIdentityStore::new();
        let teacher = ChatHandle::new(100);
        store.set_active_class(teacher, &class("10A")).await.unwrap();
        store.set_active_class(teacher, &class("11B")).await.unwrap();

        assert_eq!(store.get_active_class(teacher).await.unwrap(), Some(class("11B")));
        // The previous class keeps its stale pointer to the teacher.
        assert_eq!(store.get_active_teacher(&class("10A")).await.unwrap(), Some(teacher));
    }

    #[tokio::test]
    async fn new_session_message_resets_acknowledgements() {
        let store = InMemoryIdentityStore::new();
        let ten_a = class("10A");
        store.set_session_message(&ten_a, MessageRef::new(1)).await.unwrap();
        assert!(store.record_acknowledgement(&ten_a, &user("alice_u")).await.unwrap());

        store.set_session_message(&ten_a, MessageRef::new(2)).await.unwrap();
        assert_eq!(store.get_session_message(&ten_a).await.unwrap(), Some(MessageRef::new(2)));
        assert!(store.acknowledged_students(&ten_a).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn open_session_replaces_previous_round_in_one_step() {
        let store = InMemoryIdentityStore::new();
        let ten_a = class("10A");
        let first = ChatHandle::new(100);
        let second = ChatHandle::new(200);
        store.open_session(first, &ten_a, MessageRef::new(1)).await.unwrap();
        store.record_acknowledgement(&ten_a, &user("alice_u")).await.unwrap();

        store.open_session(second, &ten_a, MessageRef::new(2)).await.unwrap();

        assert_eq!(store.get_active_teacher(&ten_a).await.unwrap(), Some(second));
        assert_eq!(store.get_active_class(second).await.unwrap(), Some(ten_a.clone()));
        assert_eq!(store.get_session_message(&ten_a).await.unwrap(), Some(MessageRef::new(2)));
        assert!(store.acknowledged_students(&ten_a).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn acknowledgement_reports_first_insert_only() {
        let store = InMemoryIdentityStore::new();
        let ten_a = class("10A");
        assert!(store.record_acknowledgement(&ten_a, &user("alice_u")).await.unwrap());
        assert!(!store.record_acknowledgement(&ten_a, &user("alice_u")).await.unwrap());
        assert_eq!(store.acknowledged_students(&ten_a).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn close_session_removes_round_state() {
        let store = InMemoryIdentityStore::new();
        let teacher = ChatHandle::new(100);
        let ten_a = class("10A");
        store.set_active_class(teacher, &ten_a).await.unwrap();
        store.set_session_message(&ten_a, MessageRef::new(1)).await.unwrap();
        store.record_acknowledgement(&ten_a, &user("alice_u")).await.unwrap();

        store.close_session(teacher, &ten_a).await.unwrap();

        assert_eq!(store.get_active_class(teacher).await.unwrap(), None);
        assert_eq!(store.get_active_teacher(&ten_a).await.unwrap(), None);
        assert_eq!(store.get_session_message(&ten_a).await.unwrap(), None);
        assert!(store.acknowledged_students(&ten_a).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn closed_store_rejects_calls() {
        let store = InMemoryIdentityStore::new();
        store.close().await.unwrap();
        assert!(matches!(
            store.lookup_chat_handle(&user("alice_u")).await,
            Err(StoreError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn concurrent_teachers_never_split_a_class_mapping() {
        let store = std::sync::Arc::new(InMemoryIdentityStore::new());
        let ten_a = class("10A");

        let mut tasks = Vec::new();
        for id in 0..32 {
            let store = store.clone();
            let ten_a = ten_a.clone();
            tasks.push(tokio::spawn(async move {
                store.set_active_class(ChatHandle::new(id), &ten_a).await.unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let winner = store.get_active_teacher(&ten_a).await.unwrap().unwrap();
        assert_eq!(store.get_active_class(winner).await.unwrap(), Some(ten_a));
    }

    proptest! {
        #[test]
        fn lookup_returns_registered_handle(name in "[a-z][a-z0-9_]{0,15}", id in any::<i64>()) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            runtime.block_on(async {
                let store = InMemoryIdentityStore::new();
                let username = Username::new(&name).unwrap();
                store.register(&username, ChatHandle::new(id)).await.unwrap();
                prop_assert_eq!(
                    store.lookup_chat_handle(&username).await.unwrap(),
                    Some(ChatHandle::new(id))
                );
                Ok(())
            })?;
        }

        #[test]
        fn active_class_round_trips_both_directions(teacher in any::<i64>(), name in "[0-9]{1,2}[A-Z]") {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            runtime.block_on(async {
                let store = InMemoryIdentityStore::new();
                let class = ClassName::new(&name).unwrap();
                store.set_active_class(ChatHandle::new(teacher), &class).await.unwrap();
                prop_assert_eq!(
                    store.get_active_class(ChatHandle::new(teacher)).await.unwrap(),
                    Some(class.clone())
                );
                prop_assert_eq!(
                    store.get_active_teacher(&class).await.unwrap(),
                    Some(ChatHandle::new(teacher))
                );
                Ok(())
            })?;
        }
    }
}
