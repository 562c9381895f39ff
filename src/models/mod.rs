pub mod event;
pub mod login;
pub mod user;

pub use event::{ACTION_MSG_SEND, ACTION_NEW_CLASS, EventKey, EventType, NftEvent, RawNftEvent};
pub use login::{Coin, LoginRequest, PubKey, SignDoc, SignResponse, StdFee, StdSignature};
pub use user::{ClassMetadata, LikeBalance, LikerProfile, SaleRecord, SessionUserInfo};
