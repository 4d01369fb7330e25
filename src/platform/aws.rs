//! AWS platform: regions, availability zones, and AMI resolution
//!
//! The AMI catalogue maps OS labels to known image names and owners; the
//! optional lookup step resolves a name to a concrete image id by shelling
//! out to `aws ec2 describe-images`, memoized per (name, region) pair.

use std::collections::BTreeMap;
use std::process::Command;

use serde_yaml::{Mapping, Value};
use topology::{ClusterOptions, ClusterSpec, Error, ImageCache, ImageRecord, Platform, Result};

pub const AWS_DEFAULT_REGION: &str = "eu-west-1";

const SUPPORTED_DISTRIBUTIONS: &[&str] = &[
    "Debian",
    "Debian-minimal",
    "RedHat",
    "RedHat-minimal",
    "Rocky",
    "Rocky-minimal",
    "Ubuntu",
    "Ubuntu-minimal",
    "SLES",
];

/// Availability-zone suffixes per region
fn zones_per_region() -> BTreeMap<String, Vec<String>> {
    let zones = |suffixes: &[&str]| suffixes.iter().map(|s| (*s).to_string()).collect();
    let mut m = BTreeMap::new();
    m.insert("ap-northeast-1".to_string(), zones(&["a", "b", "c", "d"]));
    m.insert("ap-northeast-2".to_string(), zones(&["a", "b", "c", "d"]));
    m.insert("ap-northeast-3".to_string(), zones(&["a", "b", "c"]));
    m.insert("ap-south-1".to_string(), zones(&["a", "b", "c"]));
    m.insert("ap-southeast-1".to_string(), zones(&["a", "b", "c"]));
    m.insert("ap-southeast-2".to_string(), zones(&["a", "b", "c"]));
    m.insert("ca-central-1".to_string(), zones(&["a", "b", "d"])); // no "c" zone
    m.insert("eu-central-1".to_string(), zones(&["a", "b", "c"]));
    m.insert("eu-north-1".to_string(), zones(&["a", "b", "c"]));
    m.insert("eu-west-1".to_string(), zones(&["a", "b", "c"]));
    m.insert("eu-west-2".to_string(), zones(&["a", "b", "c"]));
    m.insert("eu-west-3".to_string(), zones(&["a", "b", "c"]));
    m.insert("sa-east-1".to_string(), zones(&["a", "b", "c"]));
    m.insert("us-east-1".to_string(), zones(&["a", "b", "c", "d", "e", "f"]));
    m.insert("us-east-2".to_string(), zones(&["a", "b", "c"]));
    m.insert("us-west-1".to_string(), zones(&["a", "b", "c"]));
    m.insert("us-west-2".to_string(), zones(&["a", "b", "c", "d"]));
    m
}

struct CatalogImage {
    name: &'static str,
    versions: &'static [&'static str],
    owner: &'static str,
    user: &'static str,
    os_family: Option<&'static str>,
}

const DEBIAN_IMAGES: &[CatalogImage] = &[
    CatalogImage {
        name: "debian-stretch-hvm-x86_64-gp2-2022-07-01-66430",
        versions: &["9", "stretch"],
        owner: "379101102735",
        user: "admin",
        os_family: None,
    },
    CatalogImage {
        name: "debian-10-amd64-20230601-1398",
        versions: &["10", "buster", "default"],
        owner: "136693071363",
        user: "admin",
        os_family: None,
    },
    CatalogImage {
        name: "debian-11-amd64-20230717-1444",
        versions: &["11", "bullseye"],
        owner: "136693071363",
        user: "admin",
        os_family: None,
    },
    CatalogImage {
        name: "debian-12-amd64-20230723-1450",
        versions: &["12", "bookworm"],
        owner: "136693071363",
        user: "admin",
        os_family: None,
    },
];

const REDHAT_IMAGES: &[CatalogImage] = &[
    CatalogImage {
        name: "RHEL-7.9_HVM-20221027-x86_64-0-Hourly2-GP2",
        versions: &["7"],
        owner: "309956199498",
        user: "ec2-user",
        os_family: None,
    },
    CatalogImage {
        name: "RHEL-8.7.0_HVM-20230330-x86_64-56-Hourly2-GP2",
        versions: &["8", "default"],
        owner: "309956199498",
        user: "ec2-user",
        os_family: None,
    },
    CatalogImage {
        name: "RHEL-9.0.0_HVM-20230313-x86_64-43-Hourly2-GP2",
        versions: &["9"],
        owner: "309956199498",
        user: "ec2-user",
        os_family: None,
    },
];

const ROCKY_IMAGES: &[CatalogImage] = &[CatalogImage {
    name: "Rocky-8-ec2-8.5-20211114.2.x86_64",
    versions: &["8", "default"],
    owner: "792107900819",
    user: "rocky",
    os_family: Some("RedHat"),
}];

const UBUNTU_IMAGES: &[CatalogImage] = &[
    CatalogImage {
        name: "ubuntu/images/hvm-ssd/ubuntu-xenial-16.04-amd64-server-20210721",
        versions: &["16.04", "xenial"],
        owner: "099720109477",
        user: "ubuntu",
        os_family: None,
    },
    CatalogImage {
        name: "ubuntu/images/hvm-ssd/ubuntu-bionic-18.04-amd64-server-20210907",
        versions: &["18.04", "bionic"],
        owner: "099720109477",
        user: "ubuntu",
        os_family: None,
    },
    CatalogImage {
        name: "ubuntu/images/hvm-ssd/ubuntu-focal-20.04-amd64-server-20220131",
        versions: &["20.04", "focal", "default"],
        owner: "099720109477",
        user: "ubuntu",
        os_family: None,
    },
    CatalogImage {
        name: "ubuntu/images/hvm-ssd/ubuntu-jammy-22.04-amd64-server-20230325",
        versions: &["22.04", "jammy"],
        owner: "099720109477",
        user: "ubuntu",
        os_family: None,
    },
];

const SLES_IMAGES: &[CatalogImage] = &[CatalogImage {
    name: "suse-sles-15-sp5-v20231020-hvm-ssd-x86_64",
    versions: &["15"],
    owner: "013907871322",
    user: "ec2-user",
    os_family: None,
}];

fn catalogue(base: &str) -> &'static [CatalogImage] {
    match base {
        "debian" => DEBIAN_IMAGES,
        "redhat" => REDHAT_IMAGES,
        "rocky" => ROCKY_IMAGES,
        "ubuntu" => UBUNTU_IMAGES,
        "sles" => SLES_IMAGES,
        _ => &[],
    }
}

/// Resolve an OS label and version to a catalogue entry
///
/// Labels outside the supported distributions are treated as literal image
/// names and pass through untouched.
fn catalogue_lookup(label: &str, version: Option<&str>, region: &str) -> Result<ImageRecord> {
    if !SUPPORTED_DISTRIBUTIONS.contains(&label) {
        return Ok(ImageRecord::named(label));
    }

    let base = label.replace("-minimal", "");
    let version = version.unwrap_or("default");
    let entry = catalogue(&base.to_ascii_lowercase())
        .iter()
        .find(|e| e.versions.contains(&version))
        .ok_or_else(|| Error::ImageNotFound {
            name: format!("{base}/{version}"),
            region: region.to_string(),
        })?;

    Ok(ImageRecord {
        name: entry.name.to_string(),
        owner: Some(entry.owner.to_string()),
        image_id: None,
        user: Some(entry.user.to_string()),
        version: entry
            .versions
            .iter()
            .find(|v| **v != "default")
            .map(|v| (*v).to_string()),
        os_family: entry.os_family.map(String::from).unwrap_or_else(|| base.clone()),
        os: base,
    })
}

/// Look up a concrete image id with `aws ec2 describe-images`
///
/// Exactly one match is required: zero and multiple matches are distinct
/// fatal errors. The caller handles memoization; this always fetches.
fn lookup_ami(image: &ImageRecord, region: &str) -> Result<ImageRecord> {
    log::info!("aws: looking up AMI {:?} in {region}", image.name);
    let mut cmd = Command::new("aws");
    cmd.args(["ec2", "describe-images", "--region", region, "--output", "json"]);
    cmd.arg("--filters")
        .arg(format!("Name=name,Values={}", image.name));
    if let Some(owner) = &image.owner {
        cmd.args(["--owners", owner]);
    }

    let output = cmd
        .output()
        .map_err(|e| Error::Lookup(format!("could not run aws ec2 describe-images: {e}")))?;
    if !output.status.success() {
        return Err(Error::Lookup(
            String::from_utf8_lossy(&output.stderr).trim().to_string(),
        ));
    }

    let json: serde_json::Value = serde_json::from_slice(&output.stdout)
        .map_err(|e| Error::Lookup(format!("unexpected describe-images output: {e}")))?;
    let images = json["Images"].as_array().cloned().unwrap_or_default();
    log::debug!("aws: {} describe-images matches", images.len());

    match images.as_slice() {
        [] => Err(Error::ImageNotFound {
            name: image.name.clone(),
            region: region.to_string(),
        }),
        [only] => {
            let mut resolved = image.clone();
            resolved.image_id = only["ImageId"].as_str().map(String::from);
            Ok(resolved)
        }
        many => Err(Error::AmbiguousImageMatch {
            name: image.name.clone(),
            region: region.to_string(),
            count: many.len(),
        }),
    }
}

pub struct Aws;

impl Platform for Aws {
    fn name(&self) -> &'static str {
        "aws"
    }

    fn default_region(&self) -> &str {
        AWS_DEFAULT_REGION
    }

    fn zones_by_region(&self) -> BTreeMap<String, Vec<String>> {
        zones_per_region()
    }

    fn validate_regions(&self, opts: &ClusterOptions) -> Result<Vec<String>> {
        let mut seen = std::collections::BTreeSet::new();
        let mut regions: Vec<String> = opts
            .regions
            .iter()
            .filter(|r| seen.insert((*r).clone()))
            .cloned()
            .collect();
        if regions.is_empty() {
            regions.push(self.default_region().to_string());
        }
        if regions.len() > 1 {
            log::warn!(
                "multiple regions selected: ec2_vpc cidr ranges must be edited manually \
                 so they don't overlap, and VPC peering must be set up after provisioning"
            );
        }
        Ok(regions)
    }

    fn resolve_image(
        &self,
        opts: &ClusterOptions,
        region: &str,
        cache: &mut ImageCache,
    ) -> Result<ImageRecord> {
        let mut record = catalogue_lookup(&opts.image_label, opts.image_version.as_deref(), region)?;
        if opts.lookup_images {
            let name = record.name.clone();
            record = cache.get_or_fetch(&name, region, || lookup_ami(&record, region))?;
        }

        let name = record.name.to_ascii_lowercase();
        if opts.instance_type == "t3.micro"
            && (name.starts_with("rhel") || name.starts_with("rocky"))
        {
            log::warn!(
                "consider --instance-type t3.medium for RedHat distributions; \
                 t3.micro instances often run out of memory"
            );
        }
        Ok(record)
    }

    fn platform_settings(
        &self,
        opts: &ClusterOptions,
        spec: &ClusterSpec,
        cache: &mut ImageCache,
    ) -> Result<BTreeMap<String, Value>> {
        let mut settings = BTreeMap::new();

        // Regions actually in use, in location order.
        let mut regions: Vec<String> = Vec::new();
        for location in &spec.locations {
            if let Some(region) = &location.region {
                if !regions.contains(region) {
                    regions.push(region.clone());
                }
            }
        }
        if regions.is_empty() {
            regions.push(self.default_region().to_string());
        }

        let mut vpc = Mapping::new();
        for region in &regions {
            let mut entry = Mapping::new();
            entry.insert("Name".into(), "Test".into());
            entry.insert("cidr".into(), "10.33.0.0/16".into());
            vpc.insert(Value::from(region.clone()), Value::Mapping(entry));
        }
        settings.insert("ec2_vpc".to_string(), Value::Mapping(vpc));

        // One image per region; the cache keeps identical (name, region)
        // pairs to a single external lookup.
        let mut image = None;
        for region in &regions {
            image = Some(self.resolve_image(opts, region, cache)?);
        }
        if let Some(image) = image {
            let mut ami = Mapping::new();
            ami.insert("Name".into(), Value::from(image.name));
            if let Some(owner) = image.owner {
                ami.insert("Owner".into(), Value::from(owner));
            }
            settings.insert("ec2_ami".to_string(), Value::Mapping(ami));
        }

        if let Some(bucket) = &opts.cluster_bucket {
            settings.insert("cluster_bucket".to_string(), Value::from(bucket.clone()));
        }
        settings.insert("ec2_instance_reachability".to_string(), "public".into());
        Ok(settings)
    }
}
