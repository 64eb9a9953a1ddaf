use crate::error::{ConfigError, Result};
use crate::exception::ExceptionType;
use crate::handler::ExceptionHandler;
use crate::response::Format;
use std::collections::HashMap;
use std::sync::Arc;

/// A handler bound to the exception type it was registered for.
#[derive(Clone)]
pub struct Registration {
    pub exception_type: &'static ExceptionType,
    pub handler: Arc<dyn ExceptionHandler>,
}

/// Result of a lookup: the winning registration and how far up the
/// hierarchy it was found.
pub struct Match<'a> {
    pub registration: &'a Registration,
    pub distance: usize,
}

/// Specificity-ranked lookup table, built once and read-only afterwards.
///
/// Lookup walks the thrown type's ancestry nearest first. At the first
/// distance with any registered handler, the earliest registration wins.
#[derive(Clone, Default)]
pub struct HandlerTable {
    registrations: Vec<Registration>,
    by_type: HashMap<&'static ExceptionType, usize>,
}

impl HandlerTable {
    /// Validate and index `registrations`, keeping their order.
    pub fn new(registrations: Vec<Registration>) -> Result<Self> {
        let mut by_type = HashMap::with_capacity(registrations.len());

        for (index, registration) in registrations.iter().enumerate() {
            let name = registration.exception_type.name();
            validate_produces(name, registration.handler.as_ref())?;
            if by_type.insert(registration.exception_type, index).is_some() {
                return Err(ConfigError::DuplicateRegistration {
                    exception: name.to_string(),
                });
            }
        }

        Ok(Self {
            registrations,
            by_type,
        })
    }

    pub fn find(&self, thrown: &'static ExceptionType) -> Option<Match<'_>> {
        let mut best: Option<(usize, usize)> = None;

        for ancestor in thrown.ancestry() {
            if let Some((distance, _)) = best {
                if ancestor.distance > distance {
                    break;
                }
            }

            let Some(&index) = self.by_type.get(ancestor.exception_type) else {
                continue;
            };
            if ancestor.distance > 0 && !self.registrations[index].handler.handles_subtypes() {
                continue;
            }

            match best {
                Some((_, current)) if current <= index => {}
                _ => best = Some((ancestor.distance, index)),
            }
        }

        best.map(|(distance, index)| Match {
            registration: &self.registrations[index],
            distance,
        })
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Registration> {
        self.registrations.iter()
    }
}

/// Every type a handler declares must be renderable, checked at startup so
/// that encoding cannot fail on an unknown type at request time.
pub(crate) fn validate_produces(exception: &str, handler: &dyn ExceptionHandler) -> Result<()> {
    let produces = handler.produces();
    if produces.is_empty() {
        return Err(ConfigError::EmptyProduces {
            exception: exception.to_string(),
        });
    }
    for media_type in produces {
        if !media_type.has_utf8_charset() {
            return Err(ConfigError::UnsupportedCharset {
                media_type: media_type.to_string(),
                charset: media_type.charset().unwrap_or_default().to_string(),
            });
        }
        if Format::for_media_type(media_type).is_none() {
            return Err(ConfigError::UnsupportedMediaType {
                media_type: media_type.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Exception;
    use crate::exception::ExceptionClass;
    use crate::handler::FnHandler;
    use crate::negotiation::MediaType;
    use crate::resolver::RequestContext;
    use crate::response::ErrorResponse;
    use axum::http::StatusCode;

    #[derive(Debug, thiserror::Error, Exception)]
    #[error("spirit")]
    struct Spirit;

    #[derive(Debug, thiserror::Error, Exception)]
    #[error("demon")]
    struct Demon;

    #[derive(Debug, thiserror::Error, Exception)]
    #[error("gozer")]
    #[exception(extends(Spirit, Demon))]
    struct Gozer;

    #[derive(Debug, thiserror::Error, Exception)]
    #[error("zuul")]
    #[exception(extends(Gozer))]
    struct Zuul;

    fn handler(status: StatusCode) -> Arc<dyn ExceptionHandler> {
        Arc::new(FnHandler::new(
            move |_: &dyn crate::exception::Exception, _: &RequestContext| {
                ErrorResponse::builder(status)
            },
        ))
    }

    fn registration<E: ExceptionClass>(status: StatusCode) -> Registration {
        Registration {
            exception_type: E::descriptor(),
            handler: handler(status),
        }
    }

    fn found_type(table: &HandlerTable, thrown: &'static ExceptionType) -> Option<&'static str> {
        table
            .find(thrown)
            .map(|m| m.registration.exception_type.name())
    }

    #[test]
    fn test_exact_match_beats_supertype() {
        let table = HandlerTable::new(vec![
            registration::<Gozer>(StatusCode::GONE),
            registration::<Zuul>(StatusCode::NOT_FOUND),
        ])
        .unwrap();

        let found = table.find(Zuul::descriptor()).unwrap();
        assert_eq!(found.registration.exception_type.name(), "Zuul");
        assert_eq!(found.distance, 0);
    }

    #[test]
    fn test_nearest_ancestor_wins() {
        let table = HandlerTable::new(vec![
            registration::<Spirit>(StatusCode::GONE),
            registration::<Gozer>(StatusCode::NOT_FOUND),
        ])
        .unwrap();

        let found = table.find(Zuul::descriptor()).unwrap();
        assert_eq!(found.registration.exception_type.name(), "Gozer");
        assert_eq!(found.distance, 1);
    }

    #[test]
    fn test_equal_distance_tie_goes_to_first_registered() {
        let demon_first = HandlerTable::new(vec![
            registration::<Demon>(StatusCode::GONE),
            registration::<Spirit>(StatusCode::NOT_FOUND),
        ])
        .unwrap();
        assert_eq!(found_type(&demon_first, Gozer::descriptor()), Some("Demon"));
        assert_eq!(found_type(&demon_first, Zuul::descriptor()), Some("Demon"));

        let spirit_first = HandlerTable::new(vec![
            registration::<Spirit>(StatusCode::NOT_FOUND),
            registration::<Demon>(StatusCode::GONE),
        ])
        .unwrap();
        assert_eq!(found_type(&spirit_first, Gozer::descriptor()), Some("Spirit"));
    }

    #[test]
    fn test_unrelated_type_is_not_matched() {
        let table = HandlerTable::new(vec![registration::<Zuul>(StatusCode::NOT_FOUND)]).unwrap();
        assert!(table.find(Gozer::descriptor()).is_none());
        assert!(table.find(Spirit::descriptor()).is_none());
    }

    #[test]
    fn test_exact_only_handlers_skip_subtypes() {
        let typed = crate::handler::TypedHandler::<Gozer, _>::new(|_, _| {
            ErrorResponse::builder(StatusCode::GONE)
        });
        let table = HandlerTable::new(vec![
            Registration {
                exception_type: Gozer::descriptor(),
                handler: Arc::new(typed),
            },
            registration::<Spirit>(StatusCode::NOT_FOUND),
        ])
        .unwrap();

        assert_eq!(found_type(&table, Gozer::descriptor()), Some("Gozer"));
        assert_eq!(found_type(&table, Zuul::descriptor()), Some("Spirit"));
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let result = HandlerTable::new(vec![
            registration::<Zuul>(StatusCode::NOT_FOUND),
            registration::<Zuul>(StatusCode::GONE),
        ]);
        assert!(matches!(
            result,
            Err(ConfigError::DuplicateRegistration { exception }) if exception == "Zuul"
        ));
    }

    #[test]
    fn test_unrenderable_produces_fails() {
        let html: MediaType = "text/html".parse().unwrap();
        let handler = FnHandler::new(|_: &dyn crate::exception::Exception, _: &RequestContext| {
            ErrorResponse::builder(StatusCode::GONE)
        })
        .with_produces([html]);

        let result = HandlerTable::new(vec![Registration {
            exception_type: Zuul::descriptor(),
            handler: Arc::new(handler),
        }]);
        assert!(matches!(result, Err(ConfigError::UnsupportedMediaType { .. })));

        let empty = FnHandler::new(|_: &dyn crate::exception::Exception, _: &RequestContext| {
            ErrorResponse::builder(StatusCode::GONE)
        })
        .with_produces(Vec::new());
        let result = HandlerTable::new(vec![Registration {
            exception_type: Zuul::descriptor(),
            handler: Arc::new(empty),
        }]);
        assert!(matches!(result, Err(ConfigError::EmptyProduces { .. })));
    }
}
