use crate::{
    api::{
        audit_log, grade, grade_mapping, grade_revision, pay_adjustment, payroll_run, payslip,
        salary_adjustment,
    },
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let api_limiter = build_limiter(config.rate_protected_per_min);

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(api_limiter)
            .service(
                web::scope("/payroll")
                    // /payroll/runs
                    .service(
                        web::resource("/runs")
                            .route(web::post().to(payroll_run::create_run))
                            .route(web::get().to(payroll_run::list_runs)),
                    )
                    // /payroll/runs/{id}
                    .service(
                        web::resource("/runs/{id}").route(web::get().to(payroll_run::get_run)),
                    )
                    .service(
                        web::resource("/runs/{id}/process")
                            .route(web::post().to(payroll_run::process_run)),
                    )
                    .service(
                        web::resource("/runs/{id}/approve")
                            .route(web::put().to(payroll_run::approve_run)),
                    )
                    .service(
                        web::resource("/runs/{id}/lock")
                            .route(web::put().to(payroll_run::lock_run)),
                    ),
            )
            .service(
                web::scope("/payslips")
                    .service(
                        web::resource("").route(web::get().to(payslip::list_payslips)),
                    )
                    .service(web::resource("/{id}").route(web::get().to(payslip::get_payslip)))
                    .service(
                        web::resource("/{id}/void").route(web::put().to(payslip::void_payslip)),
                    ),
            )
            .service(
                web::scope("/grades")
                    .service(
                        web::resource("")
                            .route(web::post().to(grade::create_grade))
                            .route(web::get().to(grade::list_grades)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(grade::get_grade))
                            .route(web::put().to(grade::update_grade)),
                    )
                    .service(
                        web::resource("/{id}/approve").route(web::put().to(grade::approve_grade)),
                    ),
            )
            .service(
                web::scope("/grade-mappings")
                    .service(
                        web::resource("")
                            .route(web::post().to(grade_mapping::create_mapping))
                            .route(web::get().to(grade_mapping::list_mappings)),
                    )
                    .service(
                        web::resource("/{id}").route(web::get().to(grade_mapping::get_mapping)),
                    )
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(grade_mapping::approve_mapping)),
                    ),
            )
            .service(
                web::scope("/grade-revisions")
                    .service(
                        web::resource("")
                            .route(web::post().to(grade_revision::create_revision))
                            .route(web::get().to(grade_revision::list_revisions)),
                    )
                    .service(
                        web::resource("/{id}").route(web::get().to(grade_revision::get_revision)),
                    )
                    .service(
                        web::resource("/{id}/status")
                            .route(web::put().to(grade_revision::change_status)),
                    )
                    .service(
                        web::resource("/{id}/implement")
                            .route(web::post().to(grade_revision::implement_revision)),
                    ),
            )
            .service(
                web::scope("/salary-adjustments")
                    .service(
                        web::resource("")
                            .route(web::post().to(salary_adjustment::create_adjustment))
                            .route(web::get().to(salary_adjustment::list_adjustments)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(salary_adjustment::get_adjustment)),
                    )
                    .service(
                        web::resource("/{id}/status")
                            .route(web::put().to(salary_adjustment::change_status)),
                    ),
            )
            .service(
                web::scope("/pay-adjustments")
                    .service(
                        web::resource("")
                            .route(web::post().to(pay_adjustment::create_workflow))
                            .route(web::get().to(pay_adjustment::list_workflows)),
                    )
                    .service(
                        web::resource("/{id}").route(web::get().to(pay_adjustment::get_workflow)),
                    )
                    .service(
                        web::resource("/{id}/impact")
                            .route(web::post().to(pay_adjustment::calculate_impact)),
                    )
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(pay_adjustment::approve_workflow)),
                    )
                    .service(
                        web::resource("/{id}/implement")
                            .route(web::post().to(pay_adjustment::implement_workflow)),
                    )
                    .service(
                        web::resource("/{id}/details")
                            .route(web::get().to(pay_adjustment::list_details)),
                    ),
            )
            .service(
                web::resource("/audit-log").route(web::get().to(audit_log::list_audit_entries)),
            ),
    );
}
