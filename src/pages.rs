use actix_web::web;

mod auth;
mod schedule;
mod attendance;
mod payroll;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg
        .service(web::scope("/auth")
            .configure(auth::config))
        .service(web::scope("/schedule")
            .configure(schedule::config))
        .service(web::scope("/attendance")
            .configure(attendance::config))
        .service(web::scope("/payroll")
            .configure(payroll::config));
}
