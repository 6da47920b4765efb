use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::modules::chat::SharedSession;

struct Entry {
    session: SharedSession,
    last_seen: Instant,
}

/// 会话注册表
///
/// 每个浏览器标签页一个会话上下文，页面连接时创建，断开时销毁。
/// 页面没能发出断开请求时，闲置超过 `idle_timeout` 的会话由后台清理回收。
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Entry>>,
    idle_timeout: Duration,
}

impl SessionRegistry {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout,
        }
    }

    /// 注册会话，返回会话 ID
    pub async fn insert(&self, session: SharedSession) -> Uuid {
        let id = Uuid::new_v4();
        let entry = Entry {
            session,
            last_seen: Instant::now(),
        };
        self.sessions.write().await.insert(id, entry);
        id
    }

    /// 按 ID 查找会话并刷新活跃时间，ID 格式错误视同不存在
    pub async fn get(&self, id: &str) -> Option<SharedSession> {
        let id = Uuid::parse_str(id).ok()?;
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(&id)?;
        entry.last_seen = Instant::now();
        Some(entry.session.clone())
    }

    /// 销毁会话
    pub async fn remove(&self, id: &str) -> bool {
        let Ok(id) = Uuid::parse_str(id) else {
            return false;
        };
        self.sessions.write().await.remove(&id).is_some()
    }

    /// 回收闲置会话，返回回收数量
    ///
    /// 仍被其他任务持有的会话（例如正在生成回复）不回收。
    pub async fn evict_idle(&self) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, entry| {
            entry.last_seen.elapsed() < self.idle_timeout || Arc::strong_count(&entry.session) > 1
        });
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

/// 启动后台清理任务，按闲置超时的一半为周期运行
pub fn spawn_idle_sweeper(registry: Arc<SessionRegistry>) -> tokio::task::JoinHandle<()> {
    let period = (registry.idle_timeout / 2).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let evicted = registry.evict_idle().await;
            if evicted > 0 {
                info!("[SessionRegistry] Evicted {} idle session(s)", evicted);
            } else {
                debug!("[SessionRegistry] No idle sessions");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::chat::{ChatSession, IdentityScheme, UserId};
    use tokio::sync::Mutex;

    const IDLE: Duration = Duration::from_secs(60);

    fn alice_session() -> SharedSession {
        Arc::new(Mutex::new(ChatSession::new(
            UserId::parse("alice").unwrap(),
            IdentityScheme::Generated,
        )))
    }

    #[tokio::test]
    async fn test_insert_get_remove() {
        let registry = SessionRegistry::new(IDLE);

        let id = registry.insert(alice_session()).await.to_string();
        assert!(registry.get(&id).await.is_some());
        assert_eq!(registry.len().await, 1);

        assert!(registry.remove(&id).await);
        assert!(!registry.remove(&id).await);
        assert!(registry.get(&id).await.is_none());
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn test_malformed_id() {
        let registry = SessionRegistry::new(IDLE);
        assert!(registry.get("not-a-uuid").await.is_none());
        assert!(!registry.remove("not-a-uuid").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_sessions_evicted() {
        let registry = SessionRegistry::new(IDLE);
        let idle = registry.insert(alice_session()).await.to_string();
        let active = registry.insert(alice_session()).await.to_string();

        tokio::time::advance(Duration::from_secs(40)).await;
        assert!(registry.get(&active).await.is_some());
        assert_eq!(registry.evict_idle().await, 0);

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(registry.evict_idle().await, 1);
        assert!(registry.get(&idle).await.is_none());
        assert!(registry.get(&active).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_in_use_is_kept() {
        let registry = SessionRegistry::new(IDLE);
        let session = alice_session();
        let id = registry.insert(session.clone()).await.to_string();

        tokio::time::advance(Duration::from_secs(120)).await;
        assert_eq!(registry.evict_idle().await, 0);

        drop(session);
        assert_eq!(registry.evict_idle().await, 1);
        assert!(registry.get(&id).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_evicts_in_background() {
        let registry = Arc::new(SessionRegistry::new(IDLE));
        registry.insert(alice_session()).await;

        let sweeper = spawn_idle_sweeper(registry.clone());
        tokio::time::sleep(Duration::from_secs(91)).await;

        assert!(registry.is_empty().await);
        sweeper.abort();
    }
}
