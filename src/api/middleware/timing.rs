//! HTTP timing middleware
//!
//! Measures every request and hands one [`TimingRecord`] to the request
//! metrics aggregator once the inner service has produced its response.

use actix_service::{Service, Transform};
use actix_web::{
    Error,
    dev::{ServiceRequest, ServiceResponse},
};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use std::rc::Rc;
use std::time::Instant;
use tracing::trace;

use crate::metrics::{EnqueueOutcome, TimingRecord, TimingSender};

/// HTTP timing middleware factory
#[derive(Clone)]
pub struct TimingMiddleware {
    sender: TimingSender,
}

impl TimingMiddleware {
    pub fn new(sender: TimingSender) -> Self {
        Self { sender }
    }
}

impl<S, B> Transform<S, ServiceRequest> for TimingMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = TimingService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(TimingService {
            service: Rc::new(service),
            sender: self.sender.clone(),
        }))
    }
}

pub struct TimingService<S> {
    service: Rc<S>,
    sender: TimingSender,
}

impl<S, B> Service<ServiceRequest> for TimingService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();
        let sender = self.sender.clone();
        let start = Instant::now();

        let method = req.method().as_str().to_string();
        let path = req.path().to_string();

        Box::pin(async move {
            let result = srv.call(req).await;
            let duration = start.elapsed();

            // actix 响应总是带状态码；未显式设置时即 200
            let status = match &result {
                Ok(response) => response.status().as_u16(),
                Err(e) => e.as_response_error().status_code().as_u16(),
            };

            let record = TimingRecord {
                path,
                method,
                status,
                duration,
            };
            match sender.enqueue_timing(record).await {
                EnqueueOutcome::Queued => {}
                outcome => trace!("Timing record not queued: {:?}", outcome),
            }

            result
        })
    }
}
