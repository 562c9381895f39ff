use std::sync::Arc;
use std::sync::atomic::Ordering;

use chrono::Utc;
use futures::future::BoxFuture;
use tracing::{debug, error, info, warn};

use super::{AccountListener, FlagGuard, WalletStore, logging_in_flag};
use crate::connector::{Account, Connection, Connector, Signer};
use crate::error::{WalletError, WalletResult};
use crate::login;
use crate::models::{SessionUserInfo, SignDoc};

impl WalletStore {
    /// The held connector, created on first use.
    pub fn connector(&self) -> Arc<dyn Connector> {
        let mut state = self.inner.state.write();
        if let Some(connector) = &state.connector {
            return connector.clone();
        }
        let connector = self.inner.connectors.create();
        state.connector = Some(connector.clone());
        connector
    }

    pub async fn open_connect_dialog(
        &self,
        language: Option<&str>,
    ) -> WalletResult<Option<Connection>> {
        self.connector().open_selection_dialog(language).await
    }

    /// Adopts a wallet connection. Returns false, touching nothing, when it carries
    /// no usable account.
    pub async fn init_wallet(&self, connection: Connection) -> bool {
        let Some(address) = connection
            .accounts
            .first()
            .and_then(Account::wallet_address)
            .map(str::to_string)
        else {
            return false;
        };

        let connector = self.connector();
        self.listen_for_account_change(&connector);

        let method = connection.method;
        self.write(|s| {
            s.method_type = method.clone();
            s.liker_info = None;
            s.address = address.clone();
            s.signer = connection.signer;
        });
        self.inner.logger.set_user(&address, method.as_deref()).await;
        let method_name = method.as_deref().unwrap_or("unknown");
        info!(address = %address, method = method_name, "Wallet initialized");

        let should_sign = self.read(|s| s.signer.is_some() && !s.is_matched_session());
        let sign = async {
            if should_sign {
                if let Err(err) = self.sign_login().await {
                    error!(address = %address, "Wallet login failed: {err}");
                }
            }
        };
        futures::join!(self.load_liker_info(&address), sign);

        if let Err(err) = self.fetch_wallet_events().await {
            warn!(address = %address, "Wallet event refresh failed: {err}");
        }
        self.write(|s| s.is_inited = true);
        true
    }

    /// Boxed entry into [`WalletStore::init_wallet`] for the paths that reach it again
    /// from inside itself (account change, lazy signer setup).
    fn init_wallet_boxed(&self, connection: Connection) -> BoxFuture<'_, bool> {
        Box::pin(self.init_wallet(connection))
    }

    async fn load_liker_info(&self, address: &str) {
        match self.inner.api.profile_by_address(address).await {
            Ok(profile) => self.write(|s| {
                if s.address == address {
                    s.liker_info = Some(profile);
                }
            }),
            Err(err) => warn!(address = %address, "Failed to fetch Liker profile: {err}"),
        }
    }

    pub async fn restore_session(&self) -> bool {
        match self.connector().restore_session() {
            Some(connection) => self.init_wallet_boxed(connection).await,
            None => false,
        }
    }

    pub async fn init_if_necessary(&self) -> WalletResult<bool> {
        match self.connector().init_if_necessary().await? {
            Some(connection) => Ok(self.init_wallet_boxed(connection).await),
            None => Ok(false),
        }
    }

    /// Signs the login challenge and establishes a server session for the connected
    /// address. Never prompts from a hidden page. A user rejection clears the identity
    /// and resolves successfully.
    pub async fn sign_login(&self) -> WalletResult<()> {
        if self.inner.visibility.is_hidden() {
            debug!("Page hidden, skipping login signature request");
            return Ok(());
        }
        if self.read(|s| s.signer.is_none()) {
            self.init_if_necessary().await?;
            if self.read(|s| s.is_matched_session()) {
                return Ok(());
            }
        }

        let (address, signer) = self.read(|s| (s.address.clone(), s.signer.clone()));
        let Some(signer) = signer.filter(|_| !address.is_empty()) else {
            return Err(WalletError::NotConnected);
        };
        let doc = login::build_sign_doc(&self.inner.config.chain, &address, Utc::now())?;

        let _logging_in = FlagGuard::raise(self, logging_in_flag);
        match self.submit_login(signer.as_ref(), &address, &doc).await {
            Ok(()) => {
                info!(address = %address, "Wallet session established");
                Ok(())
            }
            Err(err) => {
                self.write(|s| s.apply_user_info(None));
                if err.is_user_rejection() {
                    debug!(address = %address, "User rejected login signature");
                    Ok(())
                } else {
                    error!(address = %address, "Login signature flow failed: {err}");
                    Err(err)
                }
            }
        }
    }

    async fn submit_login(
        &self,
        signer: &dyn Signer,
        address: &str,
        doc: &SignDoc,
    ) -> WalletResult<()> {
        let response = signer.sign(address, doc).await?;
        let request = login::build_login_request(address, &response)?;
        self.inner.api.login(&request).await?;
        let (user_info, followees) = futures::join!(
            self.fetch_session_user_info(address),
            self.fetch_followees()
        );
        user_info?;
        followees
    }

    /// Loads the server-side session record; an empty record means the session
    /// belongs to `address`.
    pub async fn fetch_session_user_info(
        &self,
        address: &str,
    ) -> WalletResult<Option<SessionUserInfo>> {
        let info = self.inner.api.session_user_info().await?;
        let applied = info.clone().unwrap_or_else(|| SessionUserInfo {
            user: Some(address.to_string()),
            ..SessionUserInfo::default()
        });
        self.write(|s| s.apply_user_info(Some(&applied)));
        Ok(info)
    }

    pub async fn logout(&self) -> WalletResult<()> {
        self.write(|s| s.clear_identity());
        self.inner.api.logout().await
    }

    pub async fn disconnect_wallet(&self) -> WalletResult<()> {
        if let Some(connector) = self.current_connector() {
            connector.disconnect();
        }
        self.cancel_account_listener();
        self.write(|s| s.clear_connection());
        self.logout().await
    }

    pub async fn update_email(&self, email: &str) -> WalletResult<()> {
        if let Err(err) = self.inner.api.post_wallet_email(email).await {
            error!("Failed to submit wallet email: {err}");
            return Err(err);
        }
        self.write(|s| {
            s.apply_user_info(Some(&SessionUserInfo {
                email_unconfirmed: Some(email.to_string()),
                ..SessionUserInfo::default()
            }))
        });
        Ok(())
    }

    pub async fn verify_email(&self, wallet: &str, token: &str) -> WalletResult<()> {
        if let Err(err) = self.inner.api.verify_wallet_email(wallet, token).await {
            error!(wallet = %wallet, "Failed to verify wallet email: {err}");
            return Err(err);
        }
        self.write(|s| {
            if s.is_matched_session() {
                let verified = SessionUserInfo {
                    email: Some(s.email_unverified.clone()),
                    email_unconfirmed: Some(String::new()),
                    ..SessionUserInfo::default()
                };
                s.apply_user_info(Some(&verified));
            }
        });
        Ok(())
    }

    /// Subscribes to the connector's next account switch, replacing any earlier
    /// subscription. On a switch the store logs out and re-initializes with the new
    /// connection.
    fn listen_for_account_change(&self, connector: &Arc<dyn Connector>) {
        let receiver = connector.once_account_change();
        let connector = connector.clone();
        let weak = Arc::downgrade(&self.inner);
        let generation = self.inner.listener_generation.fetch_add(1, Ordering::SeqCst);

        let mut slot = self.inner.account_listener.lock();
        let task = tokio::spawn(async move {
            let Ok(method) = receiver.await else {
                return;
            };
            let Some(inner) = weak.upgrade() else {
                return;
            };
            let store = WalletStore { inner };
            store.release_account_listener(generation);
            info!(method = %method, "Wallet account changed");

            match connector.init(&method).await {
                Ok(Some(connection)) => {
                    if let Err(err) = store.logout().await {
                        warn!("Logout after account change failed: {err}");
                    }
                    store.init_wallet_boxed(connection).await;
                }
                Ok(None) => debug!(method = %method, "No connection after account change"),
                Err(err) => warn!(method = %method, "Reconnect after account change failed: {err}"),
            }
        });
        if let Some(previous) = slot.replace(AccountListener {
            generation,
            handle: task.abort_handle(),
        }) {
            previous.handle.abort();
        }
    }

    /// Forgets the listener slot if it still holds the given subscription, so the
    /// listener can re-initialize without aborting itself.
    fn release_account_listener(&self, generation: u64) {
        let mut slot = self.inner.account_listener.lock();
        if slot.as_ref().is_some_and(|listener| listener.generation == generation) {
            slot.take();
        }
    }

    pub(super) fn cancel_account_listener(&self) {
        if let Some(listener) = self.inner.account_listener.lock().take() {
            listener.handle.abort();
        }
    }
}
