//! Pinball Map API client
//!
//! [`PinballMapClient`] reads the machine catalog and location rosters, and
//! adds or removes machines at one location. Reads go through the injected
//! [`Cache`]; writes pass through [`PinballMapClient::ensure_authorized`]
//! first and are skipped with a warning in dry-run mode.

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::cache::Cache;
use crate::catalog::{
    LocationDiff, LocationMachineXref, Machine, MachinesResponse, SyncReport, UserDetails,
    XrefsResponse,
};
use crate::config::ClientConfig;
use crate::error::{PinballMapError, Result};
use crate::matching::{Canonicalized, MatchResult, NameMatcher};

pub mod auth;
pub mod transport;


use auth::{ApiAuthenticator, Authenticator, Credentials, Session, SignUpOutcome};
use transport::{Params, ReqwestTransport, Transport};

/// Client for one Pinball Map account and location
pub struct PinballMapClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    authenticator: Arc<dyn Authenticator>,
    cache: Arc<dyn Cache>,
    matcher: NameMatcher,
    session: Mutex<Session>,
    /// Xrefs at the configured location, fetched at most once per client
    lmxs: Mutex<Option<Vec<LocationMachineXref>>>,
}

impl PinballMapClient {
    /// Build a client over HTTP and log in if only a password was configured
    ///
    /// A failed login is not fatal; write operations will retry it.
    pub async fn new(config: ClientConfig) -> Result<Self> {
        let client = Self::build(config)?;
        client.authenticate_from_config().await;
        Ok(client)
    }

    /// Build a client over HTTP without logging in
    pub fn build(config: ClientConfig) -> Result<Self> {
        let timeout = Duration::from_secs(config.timeout_seconds);
        let transport: Arc<dyn Transport> =
            Arc::new(ReqwestTransport::new(&config.base_url, timeout)?);
        let cache = config.cache.build()?;

        Ok(Self::from_parts(config, transport, cache))
    }

    /// Assemble a client without any network activity
    pub fn from_parts(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        cache: Arc<dyn Cache>,
    ) -> Self {
        let authenticator = Arc::new(ApiAuthenticator::new(transport.clone()));
        Self::with_authenticator(config, transport, authenticator, cache)
    }

    pub fn with_authenticator(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
        authenticator: Arc<dyn Authenticator>,
        cache: Arc<dyn Cache>,
    ) -> Self {
        let session = Session {
            authentication_token: config.authentication_token.clone(),
            user_email: config.user_email.clone(),
        };
        let matcher = config.matching.matcher();

        Self {
            config,
            transport,
            authenticator,
            cache,
            matcher,
            session: Mutex::new(session),
            lmxs: Mutex::new(None),
        }
    }

    /// Log in with the configured email and password when no token is set
    pub async fn authenticate_from_config(&self) {
        let has_token = self.session().authentication_token.is_some();
        if !has_token {
            if let (Some(email), Some(password)) =
                (&self.config.user_email, &self.config.user_password)
            {
                if let Err(e) = self.auth_details(email, password, true).await {
                    warn!("Could not log in as {}: {}", email, e);
                }
            }
        }

        if self.credentials().is_none() {
            info!("Without user_email and authentication_token, all write operations will fail.");
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn matcher(&self) -> &NameMatcher {
        &self.matcher
    }

    /// Current write credentials, if complete
    pub fn credentials(&self) -> Option<Credentials> {
        self.session().credentials()
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn location_id(&self) -> Result<u64> {
        self.config.location_id.ok_or(PinballMapError::MissingLocation)
    }

    fn region_name(&self) -> Result<&str> {
        self.config
            .region_name
            .as_deref()
            .ok_or(PinballMapError::MissingRegion)
    }

    fn cache_key(&self, name: &str) -> String {
        format!("{}_{}", self.config.cache.key_prefix, name)
    }

    fn cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.cache.get(key)?;
        match serde_json::from_value(value) {
            Ok(value) => {
                debug!("Cache hit for {}", key);
                Some(value)
            }
            Err(e) => {
                debug!("Ignoring cached {}: {}", key, e);
                None
            }
        }
    }

    fn store<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(value) => self.cache.set(key, &value, self.config.cache.ttl()),
            Err(e) => warn!("Not caching {}: {}", key, e),
        }
    }

    /// Drop every cached response, including the in-instance xref memo
    pub fn clear_cache(&self) -> Result<()> {
        *self.lmxs.lock().unwrap_or_else(PoisonError::into_inner) = None;
        self.cache.clear()
    }

    /// The full machine catalog paired with canonical names
    pub async fn all_machines(&self) -> Result<Vec<Canonicalized<Machine>>> {
        let key = self.cache_key("machines");

        let machines = match self.cached::<Vec<Machine>>(&key) {
            Some(machines) => machines,
            None => {
                debug!("Cache miss for {}", key);
                let response = self
                    .transport
                    .request(Method::GET, "machines.json", &[])
                    .await?;
                let body: MachinesResponse = serde_json::from_value(response)
                    .map_err(|e| PinballMapError::decode("machine catalog", e))?;
                self.store(&key, &body.machines);
                body.machines
            }
        };

        Ok(self.matcher.index(machines))
    }

    /// Rank catalog machines against a free-text name
    ///
    /// `min_score` defaults to the configured matching threshold.
    pub async fn machine_by_name(
        &self,
        query: &str,
        min_score: Option<i32>,
    ) -> Result<Vec<MatchResult<Machine>>> {
        let catalog = self.all_machines().await?;
        let min_score = min_score.unwrap_or(self.config.matching.min_score);

        Ok(self
            .matcher
            .search(query, &catalog, min_score)
            .iter()
            .map(|hit| hit.cloned())
            .collect())
    }

    pub async fn machine_by_ipdb_id(&self, ipdb_id: u64) -> Result<Option<Machine>> {
        Ok(self
            .all_machines()
            .await?
            .into_iter()
            .map(|entry| entry.item)
            .find(|machine| machine.ipdb_id == Some(ipdb_id)))
    }

    pub async fn machine_by_map_id(&self, machine_id: u64) -> Result<Option<Machine>> {
        Ok(self
            .all_machines()
            .await?
            .into_iter()
            .map(|entry| entry.item)
            .find(|machine| machine.id == machine_id))
    }

    /// Machines listed at a location (the configured one by default)
    pub async fn machines_at_location(&self, location_id: Option<u64>) -> Result<Vec<Machine>> {
        let location_id = match location_id {
            Some(id) => id,
            None => self.location_id()?,
        };

        let path = format!("locations/{location_id}/machine_details.json");
        let response = self.transport.request(Method::GET, &path, &[]).await?;
        let body: MachinesResponse = serde_json::from_value(response)
            .map_err(|e| PinballMapError::decode(format!("machines at location {location_id}"), e))?;
        Ok(body.machines)
    }

    /// Xrefs at the configured location
    pub async fn location_machine_xrefs(&self) -> Result<Vec<LocationMachineXref>> {
        let memo = self
            .lmxs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(lmxs) = memo {
            return Ok(lmxs);
        }

        let location_id = self.location_id()?;
        let region = self.region_name()?;
        let key = self.cache_key(&format!("lmxs_{region}"));

        let region_lmxs = match self.cached::<Vec<LocationMachineXref>>(&key) {
            Some(lmxs) => lmxs,
            None => {
                debug!("Cache miss for {}", key);
                let path = format!("region/{region}/location_machine_xrefs.json");
                let response = self.transport.request(Method::GET, &path, &[]).await?;
                let body: XrefsResponse = serde_json::from_value(response).map_err(|e| {
                    PinballMapError::decode(format!("machine xrefs for region {region}"), e)
                })?;
                self.store(&key, &body.location_machine_xrefs);
                body.location_machine_xrefs
            }
        };

        let lmxs: Vec<LocationMachineXref> = region_lmxs
            .into_iter()
            .filter(|lmx| lmx.location.id == location_id)
            .collect();
        debug!("{} machine xref(s) at location {}", lmxs.len(), location_id);

        *self.lmxs.lock().unwrap_or_else(PoisonError::into_inner) = Some(lmxs.clone());
        Ok(lmxs)
    }

    /// The xref tying `machine_id` to the configured location
    pub async fn lmx_by_machine_id(&self, machine_id: u64) -> Result<Option<LocationMachineXref>> {
        Ok(self
            .location_machine_xrefs()
            .await?
            .into_iter()
            .find(|lmx| lmx.machine.id == machine_id))
    }

    /// What would change to make the configured location list exactly `my_ids`
    pub async fn compare_location<I>(&self, my_ids: I) -> Result<LocationDiff>
    where
        I: IntoIterator<Item = u64>,
    {
        let on_map = self.machines_at_location(None).await?;
        Ok(LocationDiff::between(
            my_ids,
            on_map.iter().map(|machine| machine.id),
        ))
    }

    /// Pass when write credentials are usable, logging in again if possible
    ///
    /// With a token and email this never touches the network. Otherwise a
    /// configured email and password are exchanged for a fresh token.
    pub async fn ensure_authorized(&self) -> Result<Credentials> {
        if let Some(credentials) = self.credentials() {
            return Ok(credentials);
        }

        let email = self
            .session()
            .user_email
            .clone()
            .or_else(|| self.config.user_email.clone());

        if let (Some(email), Some(password)) = (email, &self.config.user_password) {
            debug!("No token for {}, logging in again", email);
            match self.auth_details(&email, password, true).await {
                Ok(_) => {
                    if let Some(credentials) = self.credentials() {
                        return Ok(credentials);
                    }
                }
                Err(PinballMapError::AuthenticationFailed(_)) => {}
                Err(e) => return Err(e),
            }
        }

        Err(PinballMapError::AuthenticationRequired)
    }

    /// Send a write, or log it and skip in dry-run mode
    async fn write(
        &self,
        method: Method,
        path: &str,
        params: &Params<'_>,
    ) -> Result<Option<serde_json::Value>> {
        if self.config.dry_run {
            warn!(
                "Dry run: skipping {} {}",
                method,
                self.transport.url(path)
            );
            return Ok(None);
        }

        self.transport.request(method, path, params).await.map(Some)
    }

    /// List a machine at the configured location
    pub async fn add_machine(&self, machine_id: u64) -> Result<Option<serde_json::Value>> {
        let credentials = self.ensure_authorized().await?;
        let location_id = self.location_id()?;

        let [email, token] = credentials.params();
        let params = [
            email,
            token,
            ("location_id", location_id.to_string()),
            ("machine_id", machine_id.to_string()),
        ];
        self.write(Method::POST, "location_machine_xrefs.json", &params)
            .await
    }

    /// Delist a machine from the configured location
    ///
    /// Returns `Ok(None)` with a warning when the machine is not listed there.
    pub async fn remove_machine(&self, machine_id: u64) -> Result<Option<serde_json::Value>> {
        let credentials = self.ensure_authorized().await?;

        let Some(lmx) = self.lmx_by_machine_id(machine_id).await? else {
            warn!(
                "Machine {} is not listed at location {:?}; nothing to remove",
                machine_id, self.config.location_id
            );
            return Ok(None);
        };

        let [email, token] = credentials.params();
        let params = [email, token, ("id", lmx.id.to_string())];
        let path = format!("location_machine_xrefs/{}.json", lmx.id);
        self.write(Method::DELETE, &path, &params).await
    }

    /// Make the configured location list exactly `my_ids`
    ///
    /// A failed add or remove is recorded in the report and the run goes on.
    pub async fn update_map<I>(&self, my_ids: I) -> Result<SyncReport>
    where
        I: IntoIterator<Item = u64>,
    {
        self.ensure_authorized().await?;
        let diff = self.compare_location(my_ids).await?;

        let mut report = SyncReport {
            ignored: diff.ignore.len(),
            ..SyncReport::default()
        };

        for &machine_id in &diff.add {
            match self.add_machine(machine_id).await {
                Ok(_) => report.added += 1,
                Err(e) => {
                    error!("Failed to add machine {}: {}", machine_id, e);
                    report.errors.insert(machine_id, format!("Failed to add: {e}"));
                }
            }
        }

        for &machine_id in &diff.remove {
            match self.remove_machine(machine_id).await {
                Ok(_) => report.removed += 1,
                Err(e) => {
                    error!("Failed to remove machine {}: {}", machine_id, e);
                    report
                        .errors
                        .insert(machine_id, format!("Failed to remove: {e}"));
                }
            }
        }

        report.error_count = report.errors.len();
        info!(
            "Sync finished: {} added, {} removed, {} unchanged, {} error(s)",
            report.added, report.removed, report.ignored, report.error_count
        );
        Ok(report)
    }

    /// Log in and optionally keep the returned token for writes
    pub async fn auth_details(
        &self,
        login: &str,
        password: &str,
        update_self: bool,
    ) -> Result<UserDetails> {
        let user = match self.authenticator.authenticate(login, password).await {
            Ok(user) => user,
            Err(e) => {
                if let PinballMapError::AuthenticationFailed(message) = &e {
                    error!("Login as {} failed: {}", login, message);
                }
                return Err(e);
            }
        };

        if update_self {
            self.session().update(&user);
        }
        Ok(user)
    }

    /// Create an account, or log into it if it already exists
    pub async fn signup_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
        update_self: bool,
    ) -> Result<UserDetails> {
        match self.authenticator.sign_up(username, email, password).await? {
            SignUpOutcome::Created(user) => {
                info!("Created account {}; check {} to confirm it", username, email);
                if update_self {
                    self.session().update(&user);
                }
                Ok(user)
            }
            SignUpOutcome::Rejected(message) => {
                error!("Sign-up for {} rejected: {}", username, message);
                self.auth_details(email, password, update_self)
                    .await
                    .inspect_err(|e| {
                        if e.is_auth_error() {
                            error!("Could neither create nor log into account {}", email);
                        }
                    })
            }
        }
    }
}
