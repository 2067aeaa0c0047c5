use crate::{api::payslip, config::Config};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter; rates are validated non-zero by Config
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = (60_000 / u64::from(requests_per_min.max(1))).max(1);
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min.max(1))
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap_or_default();
        Governor::new(&cfg)
    }

    let upload_limiter = Arc::new(build_limiter(config.rate_upload_per_min));
    let generate_limiter = Arc::new(build_limiter(config.rate_generate_per_min));

    cfg.service(
        web::scope(&config.api_prefix)
            .app_data(web::PayloadConfig::new(config.max_upload_bytes))
            .service(
                web::scope("/sessions")
                    // /sessions
                    .service(
                        web::resource("")
                            .wrap(upload_limiter.clone())
                            .route(web::post().to(payslip::upload_workbook)),
                    )
                    // /sessions/{session_id}
                    .service(
                        web::resource("/{session_id}")
                            .route(web::get().to(payslip::get_session))
                            .route(web::delete().to(payslip::close_session)),
                    )
                    // /sessions/{session_id}/workbook
                    .service(
                        web::resource("/{session_id}/workbook")
                            .wrap(upload_limiter)
                            .route(web::put().to(payslip::replace_workbook)),
                    )
                    .service(
                        web::resource("/{session_id}/records")
                            .route(web::get().to(payslip::list_records)),
                    )
                    .service(
                        web::resource("/{session_id}/employees")
                            .route(web::get().to(payslip::list_employee_codes)),
                    )
                    .service(
                        web::resource("/{session_id}/selection")
                            .route(web::put().to(payslip::select_employee)),
                    )
                    // /sessions/{session_id}/payslip
                    .service(
                        web::resource("/{session_id}/payslip")
                            .wrap(generate_limiter)
                            .route(web::post().to(payslip::generate)),
                    ),
            ),
    );
}
