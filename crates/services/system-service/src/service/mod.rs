//! Service layer - business logic.

mod dict_service;
mod notice_service;

pub use dict_service::{DictManager, DictService, NewDictData};
pub use notice_service::{NewNotice, NoticeChanges, NoticeManager, NoticeQuery, NoticeService};
