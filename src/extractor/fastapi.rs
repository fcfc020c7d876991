use crate::extractor::{
    Endpoint, ExtractorConfig, HttpMethod, RejectReason, RouteExtractor, TraceEvent,
};
use crate::walker::{Argument, Callee, Decorator, Expr, FunctionDecl};
use log::debug;

/// Extractor for FastAPI-style route decorators.
///
/// A decorator qualifies when it is a call whose callee is an attribute
/// access naming one of the recognised HTTP methods:
///
/// ```python
/// @app.get("/users")
/// @router.post(path="/items")
/// ```
///
/// The receiver (`app`, `router`, ...) is not inspected. Every qualifying
/// decorator yields its own [`Endpoint`], so a function stacked with
/// `@app.get` and `@app.put` produces two.
pub struct FastApiExtractor {
    config: ExtractorConfig,
}

impl FastApiExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    fn match_decorator(
        &self,
        function: &FunctionDecl,
        decorator: &Decorator,
    ) -> Result<Endpoint, RejectReason> {
        let (callee, arguments) = match decorator {
            Decorator::Call { callee, arguments } => (callee, arguments),
            Decorator::Other { .. } => return Err(RejectReason::NotACall),
        };

        let attribute = match callee {
            Callee::Attribute { attribute, .. } => attribute,
            Callee::Other { .. } => return Err(RejectReason::NotAnAttributeCallee),
        };

        let method = HttpMethod::from_attribute(attribute)
            .ok_or_else(|| RejectReason::UnknownMethod(attribute.clone()))?;

        let path = resolve_path(arguments).ok_or(RejectReason::NoLiteralPath)?;

        let parameters = function
            .positional_parameters()
            .filter(|name| self.config.parameter_policy.admits(name))
            .map(str::to_string)
            .collect();

        Ok(Endpoint::new(path, method, parameters))
    }
}

impl RouteExtractor for FastApiExtractor {
    fn extract_routes(&self, functions: &[FunctionDecl]) -> Vec<Endpoint> {
        let mut endpoints = Vec::new();

        for function in functions {
            self.config.emit(TraceEvent::Function(function));

            for decorator in &function.decorators {
                self.config.emit(TraceEvent::Decorator {
                    function: &function.name,
                    decorator,
                });

                match self.match_decorator(function, decorator) {
                    Ok(endpoint) => {
                        debug!(
                            "Endpoint {} {} -> {} (params: {:?})",
                            endpoint.method, endpoint.path, function.name, endpoint.parameters
                        );
                        self.config.emit(TraceEvent::Endpoint(&endpoint));
                        endpoints.push(endpoint);
                    }
                    Err(reason) => {
                        debug!(
                            "Skipping decorator on {} (line {}): {}",
                            function.name, function.line, reason
                        );
                        self.config.emit(TraceEvent::Rejected {
                            function: &function.name,
                            reason,
                        });
                    }
                }
            }
        }

        endpoints
    }
}

/// Resolves the route path: a literal `path=` keyword wins, otherwise the
/// first positional argument if it is a literal. Empty strings count as
/// unresolved.
fn resolve_path(arguments: &[Argument]) -> Option<String> {
    let keyword = arguments.iter().find_map(|arg| match arg {
        Argument::Keyword { name, value } if name == "path" => literal(value),
        _ => None,
    });

    keyword.or_else(|| {
        arguments
            .iter()
            .find(|arg| !matches!(arg, Argument::Keyword { .. }))
            .and_then(|arg| match arg {
                Argument::Positional(value) => literal(value),
                _ => None,
            })
    })
}

fn literal(expr: &Expr) -> Option<String> {
    expr.as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
