//! Business logic services

pub mod campaign;
pub mod pipeline;
pub mod quality;
pub mod upload;

pub use campaign::CampaignService;
pub use quality::QualityService;
pub use upload::UploadService;
