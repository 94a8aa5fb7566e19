//! Filter execution.

use std::sync::Arc;

use crate::dispatch::GatewayError;
use crate::filters::{FilterDescriptor, FilterOutcome, ResponseFilter};
use crate::http::response::OutboundResponse;
use crate::http::InboundRequest;
use crate::routing::handler::RequestContext;

/// Runs per-route request filters and the global response filters.
#[derive(Clone, Default)]
pub struct FilterChain {
    response_filters: Vec<Arc<dyn ResponseFilter>>,
}

impl FilterChain {
    pub fn new(response_filters: Vec<Arc<dyn ResponseFilter>>) -> Self {
        Self { response_filters }
    }

    /// Run `filters` as two partitions: priority < 0, then priority >= 0,
    /// each in the given order. Stops at the first filter that halts.
    pub async fn run_request_filters(
        &self,
        filters: &[FilterDescriptor],
        ctx: &RequestContext<'_>,
        response: &mut OutboundResponse,
    ) -> Result<FilterOutcome, GatewayError> {
        let (early, late): (Vec<&FilterDescriptor>, Vec<&FilterDescriptor>) =
            filters.iter().partition(|f| f.priority < 0);

        for descriptor in early.into_iter().chain(late) {
            let outcome = descriptor.filter.apply(ctx, response).await?;
            if outcome == FilterOutcome::Halt {
                tracing::debug!(filter = %descriptor.name, "Request filter halted the chain");
                return Ok(FilterOutcome::Halt);
            }
        }
        Ok(FilterOutcome::Continue)
    }

    /// Run every global response filter in registration order.
    pub async fn run_response_filters(
        &self,
        request: &InboundRequest,
        response: &mut OutboundResponse,
    ) -> Result<(), GatewayError> {
        for filter in &self.response_filters {
            filter.apply(request, response).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::RequestFilter;
    use crate::http::codec::{JsonCodec, ResponseFormat};
    use crate::routing::handler::PathParams;
    use async_trait::async_trait;
    use axum::http::Method;
    use std::sync::Mutex;

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<&'static str>>>,
        outcome: FilterOutcome,
    }

    #[async_trait]
    impl RequestFilter for Recorder {
        async fn apply(
            &self,
            _ctx: &RequestContext<'_>,
            _response: &mut OutboundResponse,
        ) -> Result<FilterOutcome, GatewayError> {
            self.log.lock().unwrap().push(self.name);
            Ok(self.outcome)
        }
    }

    fn descriptor(
        name: &'static str,
        priority: i32,
        log: &Arc<Mutex<Vec<&'static str>>>,
        outcome: FilterOutcome,
    ) -> FilterDescriptor {
        FilterDescriptor::new(
            name,
            priority,
            Arc::new(Recorder {
                name,
                log: Arc::clone(log),
                outcome,
            }),
        )
    }

    async fn run(filters: &[FilterDescriptor]) -> FilterOutcome {
        let request = InboundRequest::new(Method::GET, "http://localhost/Items", "127.0.0.1".parse().unwrap()).unwrap();
        let params = PathParams::new();
        let ctx = RequestContext {
            request: &request,
            params: &params,
            format: ResponseFormat::Json,
            codec: &JsonCodec,
        };
        let mut response = OutboundResponse::new();
        FilterChain::default()
            .run_request_filters(filters, &ctx, &mut response)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn negatives_run_first_even_if_unsorted() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let filters = vec![
            descriptor("b0", 0, &log, FilterOutcome::Continue),
            descriptor("auth", -10, &log, FilterOutcome::Continue),
            descriptor("b5", 5, &log, FilterOutcome::Continue),
            descriptor("pre", -1, &log, FilterOutcome::Continue),
        ];

        for _ in 0..3 {
            log.lock().unwrap().clear();
            assert_eq!(run(&filters).await, FilterOutcome::Continue);
            assert_eq!(*log.lock().unwrap(), ["auth", "pre", "b0", "b5"]);
        }
    }

    #[tokio::test]
    async fn halt_stops_the_chain() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let filters = vec![
            descriptor("auth", -1, &log, FilterOutcome::Halt),
            descriptor("business", 0, &log, FilterOutcome::Continue),
        ];
        assert_eq!(run(&filters).await, FilterOutcome::Halt);
        assert_eq!(*log.lock().unwrap(), ["auth"]);
    }
}
