// 文件持久化会话存储实现
//
// 目录布局：<data_dir>/users/<user>/<conversation>.<ext>
// - 生成标识：<id>.json，内容为带标题和时间戳的完整文档
// - 兼容模式：<首条消息>.txt，内容为 {role, content} 记录组成的数组
// 读取时两种格式都接受

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

use crate::modules::chat::domain::{
    Conversation, ConversationId, ConversationSummary, IdentityScheme, Message, UserId,
};
use crate::modules::chat::ports::{ConversationStore, StoreError};

const USERS_DIR: &str = "users";
const EXTENSIONS: [&str; 2] = ["json", "txt"];

/// 文件中可能出现的两种格式
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredConversation {
    Document(Conversation),
    Legacy(Vec<Message>),
}

/// 文件持久化会话存储
///
/// 每个会话一个文件，按用户分目录存放
pub struct FileConversationStore {
    root: PathBuf,
    scheme: IdentityScheme,
}

impl FileConversationStore {
    /// 创建新的文件会话存储
    ///
    /// # Arguments
    /// * `data_dir` - 应用数据目录路径
    /// * `scheme` - 新会话文件使用的标识方式
    pub async fn new(data_dir: PathBuf, scheme: IdentityScheme) -> Result<Self, StoreError> {
        let root = data_dir.join(USERS_DIR);
        fs::create_dir_all(&root).await?;

        Ok(Self { root, scheme })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn user_dir(&self, user: &UserId) -> PathBuf {
        self.root.join(user.as_str())
    }

    fn path_for(&self, user: &UserId, id: &ConversationId, extension: &str) -> PathBuf {
        self.user_dir(user).join(format!("{}.{}", id, extension))
    }

    /// 查找会话文件，优先当前标识方式对应的扩展名
    async fn find_files(
        &self,
        user: &UserId,
        id: &ConversationId,
    ) -> Result<Vec<PathBuf>, StoreError> {
        let preferred = self.scheme.file_extension();
        let mut extensions = vec![preferred];
        extensions.extend(EXTENSIONS.iter().copied().filter(|ext| *ext != preferred));

        let mut found = Vec::new();
        for ext in extensions {
            let path = self.path_for(user, id, ext);
            if fs::try_exists(&path).await? {
                found.push(path);
            }
        }
        Ok(found)
    }

    /// 解析单个会话文件
    async fn read_file(path: &Path, id: ConversationId) -> Result<Conversation, StoreError> {
        let modified: DateTime<Utc> = fs::metadata(path).await?.modified()?.into();
        let content = fs::read_to_string(path).await?;

        let conversation = match serde_json::from_str::<StoredConversation>(&content)? {
            StoredConversation::Document(doc) if doc.id() == &id => doc,
            StoredConversation::Document(doc) => {
                // 文件被改名时以文件名为准
                Conversation::restore(
                    id,
                    doc.title().to_string(),
                    doc.created_at(),
                    doc.updated_at(),
                    doc.messages().to_vec(),
                )
            }
            StoredConversation::Legacy(messages) => {
                Conversation::from_messages(id, messages, modified)
            }
        };
        Ok(conversation)
    }

    /// 从文件名解析会话标识，忽略无关文件
    fn id_from_path(path: &Path) -> Option<ConversationId> {
        let ext = path.extension()?.to_str()?;
        if !EXTENSIONS.contains(&ext) {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        ConversationId::parse(stem).ok()
    }

    fn serialize(&self, conversation: &Conversation) -> Result<String, StoreError> {
        let content = match self.scheme {
            IdentityScheme::Generated => serde_json::to_string_pretty(conversation)?,
            IdentityScheme::FirstMessage => serde_json::to_string_pretty(conversation.messages())?,
        };
        Ok(content)
    }
}

#[async_trait]
impl ConversationStore for FileConversationStore {
    async fn ensure_user_directory(&self, user: &UserId) -> Result<(), StoreError> {
        fs::create_dir_all(self.user_dir(user)).await?;
        Ok(())
    }

    async fn list_conversations(
        &self,
        user: &UserId,
    ) -> Result<Vec<ConversationSummary>, StoreError> {
        let dir = self.user_dir(user);
        if !fs::try_exists(&dir).await? {
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(&dir).await?;
        let mut listed: Vec<(std::time::SystemTime, ConversationSummary)> = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let Some(id) = Self::id_from_path(&path) else {
                continue;
            };
            let modified = match entry.metadata().await.and_then(|m| m.modified()) {
                Ok(modified) => modified,
                Err(e) => {
                    warn!("[FileConversationStore] Skipping {:?}: {}", path, e);
                    continue;
                }
            };

            match Self::read_file(&path, id).await {
                Ok(conversation) => {
                    let mut summary = conversation.summary();
                    summary.updated_at = modified.into();
                    listed.push((modified, summary));
                }
                Err(e) => warn!("[FileConversationStore] Skipping unreadable {:?}: {}", path, e),
            }
        }

        // 按修改时间排序（最新的在前）
        listed.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(listed.into_iter().map(|(_, summary)| summary).collect())
    }

    async fn load_conversation(
        &self,
        user: &UserId,
        id: &ConversationId,
    ) -> Result<Conversation, StoreError> {
        let files = self.find_files(user, id).await?;
        let path = files
            .first()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

        debug!("[FileConversationStore] Loading {:?}", path);
        Self::read_file(path, id.clone()).await
    }

    async fn save_conversation(
        &self,
        user: &UserId,
        conversation: &Conversation,
    ) -> Result<bool, StoreError> {
        if conversation.is_empty() {
            return Ok(false);
        }

        self.ensure_user_directory(user).await?;

        let path = self.path_for(user, conversation.id(), self.scheme.file_extension());
        let content = self.serialize(conversation)?;
        fs::write(&path, content).await?;

        // 另一种格式的同名文件已被取代
        for stale in self.find_files(user, conversation.id()).await? {
            if stale != path {
                fs::remove_file(&stale).await?;
            }
        }

        debug!(
            "[FileConversationStore] Saved {} messages to {:?}",
            conversation.len(),
            path
        );
        Ok(true)
    }

    async fn delete_conversation(
        &self,
        user: &UserId,
        id: &ConversationId,
    ) -> Result<(), StoreError> {
        let files = self.find_files(user, id).await?;
        if files.is_empty() {
            return Err(StoreError::NotFound(id.to_string()));
        }

        for path in files {
            fs::remove_file(&path).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn alice() -> UserId {
        UserId::parse("alice").unwrap()
    }

    fn exchange(scheme: IdentityScheme, first: &str, reply: &str) -> Conversation {
        let id = scheme.derive(first).unwrap();
        let mut conversation = Conversation::begin(id, Message::new_user(first));
        conversation.push(Message::new_assistant(reply));
        conversation
    }

    async fn store(dir: &TempDir, scheme: IdentityScheme) -> FileConversationStore {
        FileConversationStore::new(dir.path().to_path_buf(), scheme)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir, IdentityScheme::Generated).await;

        let conversation = exchange(IdentityScheme::Generated, "hi", "hello");
        assert!(store.save_conversation(&alice(), &conversation).await.unwrap());

        let loaded = store
            .load_conversation(&alice(), conversation.id())
            .await
            .unwrap();
        assert_eq!(loaded.messages(), conversation.messages());
        assert_eq!(loaded.title(), "hi");
    }

    #[tokio::test]
    async fn test_first_message_identity() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir, IdentityScheme::FirstMessage).await;

        let conversation = exchange(IdentityScheme::FirstMessage, "hi", "hello");
        store.save_conversation(&alice(), &conversation).await.unwrap();

        let path = temp_dir.path().join("users/alice/hi.txt");
        let raw = std::fs::read_to_string(path).unwrap();
        let records: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            records,
            serde_json::json!([
                {"role": "user", "content": "hi"},
                {"role": "assistant", "content": "hello"}
            ])
        );

        let id = ConversationId::parse("hi").unwrap();
        let loaded = store.load_conversation(&alice(), &id).await.unwrap();
        assert_eq!(
            loaded.messages(),
            &[Message::new_user("hi"), Message::new_assistant("hello")]
        );
    }

    #[tokio::test]
    async fn test_save_empty_is_noop() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir, IdentityScheme::Generated).await;

        let empty = Conversation::from_messages(ConversationId::generate(), Vec::new(), Utc::now());
        assert!(!store.save_conversation(&alice(), &empty).await.unwrap());

        // 连用户目录都不会创建
        assert!(!temp_dir.path().join("users/alice").exists());
    }

    #[tokio::test]
    async fn test_load_missing() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir, IdentityScheme::Generated).await;

        let id = ConversationId::parse("missing").unwrap();
        let result = store.load_conversation(&alice(), &id).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir, IdentityScheme::Generated).await;

        let conversation = exchange(IdentityScheme::Generated, "bye", "see you");
        store.save_conversation(&alice(), &conversation).await.unwrap();

        store
            .delete_conversation(&alice(), conversation.id())
            .await
            .unwrap();

        let result = store.load_conversation(&alice(), conversation.id()).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));

        let again = store.delete_conversation(&alice(), conversation.id()).await;
        assert!(matches!(again, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_list_orders_by_modification() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir, IdentityScheme::Generated).await;

        assert!(store.list_conversations(&alice()).await.unwrap().is_empty());

        let first = exchange(IdentityScheme::Generated, "first", "1");
        let second = exchange(IdentityScheme::Generated, "second", "2");
        store.save_conversation(&alice(), &first).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        store.save_conversation(&alice(), &second).await.unwrap();

        let listed = store.list_conversations(&alice()).await.unwrap();
        let titles: Vec<&str> = listed.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["second", "first"]);

        // 再次保存会移到最前
        tokio::time::sleep(Duration::from_millis(20)).await;
        store.save_conversation(&alice(), &first).await.unwrap();
        let listed = store.list_conversations(&alice()).await.unwrap();
        assert_eq!(&listed[0].id, first.id());
    }

    #[tokio::test]
    async fn test_list_skips_corrupt_and_foreign_files() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir, IdentityScheme::Generated).await;

        let conversation = exchange(IdentityScheme::Generated, "ok", "fine");
        store.save_conversation(&alice(), &conversation).await.unwrap();

        let dir = temp_dir.path().join("users/alice");
        std::fs::write(dir.join("broken.json"), "{not json").unwrap();
        std::fs::write(dir.join("notes.md"), "# ignored").unwrap();

        let listed = store.list_conversations(&alice()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(&listed[0].id, conversation.id());
    }

    #[tokio::test]
    async fn test_reads_legacy_file_in_generated_mode() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir, IdentityScheme::Generated).await;

        let dir = temp_dir.path().join("users/alice");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("你好.txt"),
            r#"[{"role":"user","content":"你好"},{"role":"assistant","content":"您好"}]"#,
        )
        .unwrap();

        let listed = store.list_conversations(&alice()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id.as_str(), "你好");

        // 继续对话后以新格式保存，旧文件被替换
        let mut conversation = store
            .load_conversation(&alice(), &listed[0].id)
            .await
            .unwrap();
        conversation.push(Message::new_user("再见"));
        store.save_conversation(&alice(), &conversation).await.unwrap();

        assert!(!dir.join("你好.txt").exists());
        assert!(dir.join("你好.json").exists());
        assert_eq!(store.list_conversations(&alice()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let temp_dir = TempDir::new().unwrap();
        let store = store(&temp_dir, IdentityScheme::Generated).await;
        let bob = UserId::parse("bob").unwrap();

        store.ensure_user_directory(&bob).await.unwrap();
        store.ensure_user_directory(&bob).await.unwrap();

        let conversation = exchange(IdentityScheme::Generated, "hi", "hello");
        store.save_conversation(&alice(), &conversation).await.unwrap();

        assert!(store.list_conversations(&bob).await.unwrap().is_empty());
        let result = store.load_conversation(&bob, conversation.id()).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }
}
