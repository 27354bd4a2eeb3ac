//! Method catalog
//!
//! Each supported REST method is one [`Method`] impl binding a parameter
//! type to the remote name and the response type. Adding a method means
//! adding a parameter/result pair and one line to the table below.

use serde::de::DeserializeOwned;

use crate::base::{MethodsParams, MethodsResponse, ScopeParams, ScopeResponse};
use crate::crm::{ItemList, ItemListParams, TypeList, TypeListParams};
use crate::disk::{
    AddFolderParams, AddSubfolderParams, DeleteTreeParams, DeleteTreeResponse, FileParams,
    FileResponse, FolderChildren, FolderChildrenParams, FolderParams, FolderResponse,
    StorageList, StorageListParams, StorageParams, StorageResponse, UploadFileParams,
    UploadResponse, UploadUrlParams,
};
use crate::params::BitrixParams;

/// A parameter type that names its remote method and response
pub trait Method: BitrixParams {
    /// Dotted remote name, e.g. `disk.folder.get`
    const NAME: &'static str;

    /// Response envelope the result decodes into
    type Output: DeserializeOwned;
}

/// One catalog row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodEntry {
    pub name: &'static str,
    pub params: &'static str,
    pub output: &'static str,
}

macro_rules! catalog {
    ($($name:literal: $params:ty => $output:ty),* $(,)?) => {
        $(
            impl Method for $params {
                const NAME: &'static str = $name;
                type Output = $output;
            }
        )*

        /// Every method the client knows, in declaration order
        pub const CATALOG: &[MethodEntry] = &[
            $(MethodEntry {
                name: $name,
                params: stringify!($params),
                output: stringify!($output),
            }),*
        ];
    };
}

catalog! {
    "methods": MethodsParams => MethodsResponse,
    "scope": ScopeParams => ScopeResponse,
    "disk.storage.getlist": StorageListParams => StorageList,
    "disk.storage.get": StorageParams => StorageResponse,
    "disk.storage.addfolder": AddFolderParams => FolderResponse,
    "disk.folder.get": FolderParams => FolderResponse,
    "disk.folder.getchildren": FolderChildrenParams => FolderChildren,
    "disk.folder.addsubfolder": AddSubfolderParams => FolderResponse,
    "disk.folder.deletetree": DeleteTreeParams => DeleteTreeResponse,
    "disk.file.get": FileParams => FileResponse,
    "disk.folder.uploadfile": UploadFileParams => UploadResponse,
    "disk.folder.uploadfile": UploadUrlParams => UploadResponse,
    "crm.type.list": TypeListParams => TypeList,
    "crm.item.list": ItemListParams => ItemList,
}

/// Whether a remote method name has a typed binding
pub fn is_known(name: &str) -> bool {
    CATALOG.iter().any(|entry| entry.name == name)
}

/// Catalog rows for one remote method name
pub fn entries(name: &str) -> impl Iterator<Item = &'static MethodEntry> + '_ {
    CATALOG.iter().filter(move |entry| entry.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_names_bound_to_types() {
        assert_eq!(<FolderChildrenParams as Method>::NAME, "disk.folder.getchildren");
        assert_eq!(<ItemListParams as Method>::NAME, "crm.item.list");
        assert_eq!(<UploadUrlParams as Method>::NAME, <UploadFileParams as Method>::NAME);
    }

    #[test]
    fn test_catalog_lists_every_method() {
        let names: BTreeSet<_> = CATALOG.iter().map(|entry| entry.name).collect();
        assert_eq!(names.len(), 13);
        assert!(names.iter().all(|name| !name.contains('/')));
    }

    #[test]
    fn test_lookup() {
        assert!(is_known("disk.folder.get"));
        assert!(!is_known("disk.folder.rename"));
        assert_eq!(entries("disk.folder.uploadfile").count(), 2);
        let entry = entries("crm.type.list").next().unwrap();
        assert_eq!(entry.params, "TypeListParams");
        assert_eq!(entry.output, "TypeList");
    }
}
