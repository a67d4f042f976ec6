//! Fakes shared by the plugin's unit tests.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::collections::{BTreeSet, HashMap};
use std::sync::Mutex;
use steamcord_api::{ActionBatch, ApiError, ApiResult, RemoteAccountService};
use steamcord_rewards::{AccountRecord, DeferredAction, SteamAccount, GROUP_NAME_ARGUMENT};

pub enum PlayerLookup {
    Linked(AccountRecord),
    NotLinked,
    Fails(u16),
}

pub struct FakeApi {
    pub lookup: Mutex<PlayerLookup>,
    pub lookups: Mutex<Vec<String>>,
    pub actions: Mutex<Vec<DeferredAction>>,
    pub undecodable: Mutex<BTreeSet<i64>>,
    pub acknowledged: Mutex<Vec<BTreeSet<i64>>>,
    pub enqueued: Mutex<Vec<Vec<String>>>,
    fail_action_fetch: bool,
    fail_acknowledgment: bool,
}

impl FakeApi {
    pub fn new(lookup: PlayerLookup) -> Self {
        Self {
            lookup: Mutex::new(lookup),
            lookups: Mutex::new(Vec::new()),
            actions: Mutex::new(Vec::new()),
            undecodable: Mutex::new(BTreeSet::new()),
            acknowledged: Mutex::new(Vec::new()),
            enqueued: Mutex::new(Vec::new()),
            fail_action_fetch: false,
            fail_acknowledgment: false,
        }
    }

    pub fn failing_action_fetch(mut self) -> Self {
        self.fail_action_fetch = true;
        self
    }

    pub fn failing_acknowledgment(mut self) -> Self {
        self.fail_acknowledgment = true;
        self
    }

    pub fn queue(&self, action: DeferredAction) {
        self.actions.lock().unwrap().push(action);
    }

    pub fn queue_undecodable(&self, id: i64) {
        self.undecodable.lock().unwrap().insert(id);
    }

    pub fn acknowledged_ids(&self) -> Vec<i64> {
        self.acknowledged
            .lock()
            .unwrap()
            .iter()
            .flatten()
            .copied()
            .collect()
    }

    pub fn action(id: i64, name: &str, group: &str, steam_id: &str, minute: u32) -> DeferredAction {
        DeferredAction {
            id,
            definition_name: name.to_string(),
            target_account: AccountRecord::new(100).with_steam(SteamAccount {
                steam_id: steam_id.to_string(),
                is_steam_group_member: false,
            }),
            arguments: HashMap::from([(GROUP_NAME_ARGUMENT.to_string(), group.to_string())]),
            created: Utc.with_ymd_and_hms(2022, 3, 1, 12, minute, 0).unwrap(),
        }
    }
}

#[async_trait]
impl RemoteAccountService for FakeApi {
    async fn fetch_player_by_steam_id(&self, steam_id: &str) -> ApiResult<Option<AccountRecord>> {
        self.lookups.lock().unwrap().push(steam_id.to_string());
        match &*self.lookup.lock().unwrap() {
            PlayerLookup::Linked(record) => Ok(Some(record.clone())),
            PlayerLookup::NotLinked => Ok(None),
            PlayerLookup::Fails(status) => Err(ApiError::Status {
                status: *status,
                body: String::new(),
            }),
        }
    }

    async fn enqueue_steam_ids(&self, steam_ids: &[String]) -> ApiResult<()> {
        if steam_ids.is_empty() {
            return Err(ApiError::InvalidArgument("empty".to_string()));
        }
        self.enqueued.lock().unwrap().push(steam_ids.to_vec());
        Ok(())
    }

    async fn fetch_deferred_actions(&self) -> ApiResult<ActionBatch> {
        if self.fail_action_fetch {
            return Err(ApiError::Status {
                status: 503,
                body: String::new(),
            });
        }
        Ok(ActionBatch {
            actions: self.actions.lock().unwrap().drain(..).collect(),
            undecodable: std::mem::take(&mut *self.undecodable.lock().unwrap()),
        })
    }

    async fn acknowledge_actions(&self, ids: &BTreeSet<i64>) -> ApiResult<()> {
        if self.fail_acknowledgment {
            return Err(ApiError::Status {
                status: 500,
                body: String::new(),
            });
        }
        self.acknowledged.lock().unwrap().push(ids.clone());
        Ok(())
    }
}
