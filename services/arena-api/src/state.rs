use std::sync::Arc;

use crate::challonge::BracketService;
use crate::chain::ChainClient;
use crate::config::Settings;
use crate::launch::PoolLauncher;
use crate::storage::ObjectStorage;
use crate::store::Store;
use crate::wallet::WalletSigner;

/// Collaborators shared by every request. Built once in `main`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub bracket: Arc<dyn BracketService>,
    pub chain: Arc<dyn ChainClient>,
    pub storage: Arc<dyn ObjectStorage>,
    pub launcher: Arc<dyn PoolLauncher>,
    /// Signs on-chain tournament creation when configured.
    pub server_wallet: Option<Arc<dyn WalletSigner>>,
    pub settings: Arc<Settings>,
}
