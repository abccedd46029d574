use super::LogError;
use ::log::LevelFilter;
use log4rs::config::Logger;
use std::{collections::HashMap, env, mem};

#[derive(Clone)]
pub(super) struct LoggerSpec {
    pub name: String,
    pub level: LevelFilter,
}

impl LoggerSpec {
    pub fn logger(&self) -> Logger {
        Logger::builder().build(self.name.clone(), self.level)
    }
}

pub(super) struct Loggers {
    loggers: Vec<LoggerSpec>,
    root_level: LevelFilter,
}

impl Loggers {
    pub fn root_level(&self) -> LevelFilter {
        self.root_level
    }

    pub fn items(&self) -> impl Iterator<Item = Logger> + '_ {
        self.loggers.iter().map(|x| x.logger())
    }
}

/// Parses filter expressions of the form `info,kestrel_consensus=trace,kestrel_database=warn`.
///
/// A bare level sets the root level, `name=level` sets a module level and a bare module name
/// enables everything for that module. Malformed entries are reported and skipped.
pub(super) struct Builder {
    loggers: HashMap<String, LevelFilter>,
    root_level: Option<LevelFilter>,
}

impl Builder {
    pub fn new() -> Builder {
        Builder { loggers: HashMap::new(), root_level: None }
    }

    pub fn parse_env(&mut self, env_name: &str) -> &mut Self {
        self.parse_expression(&env::var(env_name).unwrap_or_default())
    }

    pub fn parse_expression(&mut self, expression: &str) -> &mut Self {
        for spec in expression.split(',').map(|x| x.trim()).filter(|x| !x.is_empty()) {
            match Self::parse_spec(spec) {
                Ok((Some(name), level)) => {
                    self.loggers.insert(name.to_owned(), level);
                }
                Ok((None, level)) => {
                    self.root_level = Some(level);
                }
                Err(err) => println!("Ignoring invalid logging spec: {err}"),
            }
        }
        self
    }

    fn parse_spec(spec: &str) -> Result<(Option<&str>, LevelFilter), LogError> {
        let mut parts = spec.split('=');
        match (parts.next(), parts.next().map(|x| x.trim()), parts.next()) {
            (Some(part0), None, None) => match part0.parse() {
                Ok(level) => Ok((None, level)),
                Err(_) => Ok((Some(part0), LevelFilter::max())),
            },
            (Some(part0), Some(""), None) => Ok((Some(part0), LevelFilter::max())),
            (Some(part0), Some(part1), None) => {
                part1.parse().map(|level| (Some(part0), level)).map_err(|_| LogError::ParseLoggerSpec(spec.to_owned()))
            }
            _ => Err(LogError::ParseLoggerSpec(spec.to_owned())),
        }
    }

    pub fn root_level(&mut self, root_level: LevelFilter) -> &mut Self {
        self.root_level = Some(root_level);
        self
    }

    pub fn build(&mut self) -> Loggers {
        let loggers = mem::take(&mut self.loggers).into_iter().map(|(name, level)| LoggerSpec { name, level }).collect();
        Loggers { loggers, root_level: self.root_level.take().unwrap_or(LevelFilter::Error) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_expression() {
        let loggers = Builder::new().parse_expression("info, kestrel_consensus=trace, kestrel_database, bogus=lvl").build();
        assert_eq!(loggers.root_level(), LevelFilter::Info);

        let mut specs: Vec<(String, LevelFilter)> = loggers.loggers.iter().map(|x| (x.name.clone(), x.level)).collect();
        specs.sort();
        assert_eq!(
            specs,
            vec![("kestrel_consensus".to_owned(), LevelFilter::Trace), ("kestrel_database".to_owned(), LevelFilter::max())]
        );
    }

    #[test]
    fn test_default_root_level() {
        let loggers = Builder::new().parse_expression("").build();
        assert_eq!(loggers.root_level(), LevelFilter::Error);
    }
}
