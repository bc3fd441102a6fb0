use thiserror::Error;
use tracing::{debug, info, warn};
use crate::{
    dns::{Provider, RecordType},
    ip::{IpFamily, IpSource, PublicAddresses},
    settings::DnsSettings,
};

/// Brings the A/AAAA records of one domain in line with the public addresses
/// of this host.
pub struct Updater<D: Provider, S: IpSource> {
    provider: D,
    source: S,

    dns: DnsSettings,
    dry_run: bool,
}

impl<D: Provider, S: IpSource> Updater<D, S> {
    pub fn new(provider: D, source: S, dns: DnsSettings) -> Self {
        Self {
            provider,
            source,
            dns,
            dry_run: false,
        }
    }

    /// Compare only, leaving every record as it is.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Runs one reconciliation pass.
    ///
    /// Lookup and fetch failures end the pass. Rejected updates are logged,
    /// recorded in the summary and the pass continues.
    pub async fn run(&self) -> Result<RunSummary, UpdateError<D::Error, S::Error>> {
        info!(domain = %self.dns.domain, "updating the records of {} ...", self.dns.domain);

        let addresses = self.resolve().await?;

        let mut summary = RunSummary::default();
        for name in &self.dns.records {
            let outcome = self.reconcile(name, &addresses).await?;
            summary.push(name, outcome);
        }

        if summary.failed() > 0 {
            warn!(
                changed = summary.changed(),
                failed = summary.failed(),
                "{} DNS records were changed, {} updates failed",
                summary.changed(),
                summary.failed(),
            );
        } else {
            info!(
                changed = summary.changed(),
                skipped = summary.skipped(),
                "success! {} DNS records were changed",
                summary.changed(),
            );
        }

        Ok(summary)
    }

    async fn resolve(&self) -> Result<PublicAddresses, UpdateError<D::Error, S::Error>> {
        let mut addresses = PublicAddresses::default();

        for (family, enabled) in [(IpFamily::V4, self.dns.ipv4), (IpFamily::V6, self.dns.ipv6)] {
            if !enabled {
                debug!("{} lookup disabled", family);
                continue;
            }

            let ip = self.source.public_ip(family)
                .await
                .map_err(|source| UpdateError::Resolve { family, source })?;
            info!("public {}: {}", family, ip);
            addresses.set(family, ip);
        }

        Ok(addresses)
    }

    #[tracing::instrument(skip(self, addresses), fields(domain = %self.dns.domain))]
    async fn reconcile(
        &self,
        name: &str,
        addresses: &PublicAddresses,
    ) -> Result<RecordOutcome, UpdateError<D::Error, S::Error>> {
        info!("updating the entries of {}@{} ...", name, self.dns.domain);

        let mut current = Vec::with_capacity(RecordType::ALL.len());
        for rtype in RecordType::ALL {
            let Some(ip) = addresses.get(rtype.family()) else { continue };

            let values = self.provider.get_record(&self.dns.domain, name, rtype)
                .await
                .map_err(|source| UpdateError::Fetch {
                    domain: self.dns.domain.clone(),
                    name: name.to_owned(),
                    rtype,
                    source,
                })?;
            current.push((rtype, ip, values));
        }

        if current.iter().all(|(_, _, values)| values.is_empty()) {
            warn!("the record {} does not exist and can not be updated", name);
            return Ok(RecordOutcome::Absent);
        }

        let mut updates = Vec::with_capacity(current.len());
        for (rtype, ip, values) in current {
            // Only the first value of the rrset is compared.
            let outcome = match values.first() {
                None => {
                    debug!("no {} record for {}, not creating it", rtype, name);
                    continue;
                }
                Some(existing) if existing.as_str() == ip => {
                    debug!("{} record of {} is up to date", rtype, name);
                    UpdateOutcome::Unchanged
                }
                Some(existing) => self.update(name, rtype, existing, ip).await,
            };
            updates.push((rtype, outcome));
        }

        Ok(RecordOutcome::Checked(updates))
    }

    async fn update(&self, name: &str, rtype: RecordType, existing: &str, ip: &str) -> UpdateOutcome {
        if self.dry_run {
            info!("{} -> {}@{}: would change {} to {}", rtype, name, self.dns.domain, existing, ip);
            return UpdateOutcome::Pending;
        }

        match self.provider.update_record(&self.dns.domain, name, rtype, ip).await {
            Ok(()) => {
                info!("{} -> {}@{}: changed {} to {}", rtype, name, self.dns.domain, existing, ip);
                UpdateOutcome::Changed
            }
            Err(e) => {
                warn!("{} -> {}@{}: {}", rtype, name, self.dns.domain, e);
                UpdateOutcome::Failed(e.to_string())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Unchanged,
    Changed,
    /// Left alone because of a dry run.
    Pending,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Neither an A nor an AAAA rrset exists at the provider.
    Absent,
    Checked(Vec<(RecordType, UpdateOutcome)>),
}

#[derive(Debug, Default)]
pub struct RunSummary {
    records: Vec<(String, RecordOutcome)>,
}

impl RunSummary {
    fn push(&mut self, name: &str, outcome: RecordOutcome) {
        self.records.push((name.to_owned(), outcome));
    }

    pub fn records(&self) -> &[(String, RecordOutcome)] {
        &self.records
    }

    pub fn changed(&self) -> usize {
        self.count(|o| matches!(o, UpdateOutcome::Changed))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, UpdateOutcome::Failed(_)))
    }

    pub fn pending(&self) -> usize {
        self.count(|o| matches!(o, UpdateOutcome::Pending))
    }

    pub fn skipped(&self) -> usize {
        self.records.iter()
            .filter(|(_, outcome)| *outcome == RecordOutcome::Absent)
            .count()
    }

    fn count(&self, f: impl Fn(&UpdateOutcome) -> bool) -> usize {
        self.records.iter()
            .filter_map(|(_, outcome)| match outcome {
                RecordOutcome::Checked(updates) => Some(updates),
                RecordOutcome::Absent => None,
            })
            .flatten()
            .filter(|(_, o)| f(o))
            .count()
    }
}

#[derive(Debug, Error)]
pub enum UpdateError<DE, SE> {
    #[error("unable to get the public {family} address: {source}")]
    Resolve {
        family: IpFamily,
        #[source]
        source: SE,
    },
    #[error("unable to get the {rtype} record of {name}@{domain}: {source}")]
    Fetch {
        domain: String,
        name: String,
        rtype: RecordType,
        #[source]
        source: DE,
    },
}
