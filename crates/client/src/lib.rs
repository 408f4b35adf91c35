//! Network clients for hakken.
//!
//! This crate provides the rate-limited GitHub API client with credential
//! rotation, and the plain HTTP fetcher used to download candidate files.

pub mod credentials;
pub mod fetch;
pub mod github;

pub use credentials::{Credential, CredentialRotator, Rotation};
pub use fetch::{ContentFetcher, FetchClient, FetchConfig, FetchResponse};
pub use github::{
    CodeHost, CodeSearchPage, CodeSearchRequest, EntryKind, GitHubClient, GitHubConfig, GitHubError, RepositoryTree,
    SearchHit, TreeEntry,
};
