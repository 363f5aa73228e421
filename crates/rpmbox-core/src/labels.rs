use rpmbox_config::MountSpec;
use std::ffi::CString;
use std::fs;
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// SELinux type required on bind-mount sources for container access.
pub const CONTAINER_CONTEXT_TYPE: &str = "container_file_t";

const SELINUX_XATTR: &str = "security.selinux";

#[derive(Debug, Error)]
pub enum LabelError {
    #[error("failed to read SELinux context of {path}: {source}")]
    ReadContext {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to set SELinux context of {path}: {source}")]
    WriteContext {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to walk mount source {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("SELinux context '{context}' of {path} is not a user:role:type tuple")]
    MalformedContext { path: PathBuf, context: String },
}

/// Whether the host has an active SELinux subsystem.
pub fn selinux_enabled() -> bool {
    Path::new("/sys/fs/selinux/enforce").exists()
}

/// Bring the SELinux type of every labeled mount source in line with
/// `container_file_t`, preserving the user/role/level fields.
///
/// No-op when SELinux is disabled or no mount requests labeling. Any
/// context read failure aborts the whole pass: label correctness is a
/// precondition for running the container, and a partial relabel would
/// hide that.
///
/// Running twice on an already-correct tree performs reads only.
pub fn relabel_mounts(mounts: &[MountSpec]) -> Result<(), LabelError> {
    if !mounts.iter().any(|m| m.selinux_label) {
        return Ok(());
    }
    if !selinux_enabled() {
        debug!("SELinux disabled, skipping mount relabeling");
        return Ok(());
    }

    for mount in mounts.iter().filter(|m| m.selinux_label) {
        for_each_target(mount, &mut |path| {
            relabel_path(path, CONTAINER_CONTEXT_TYPE)
        })?;
    }
    Ok(())
}

/// Visit every labeling target of a mount: just the source path for
/// non-recursive mounts, otherwise every directory and regular file in the
/// source tree. The walk streams through `read_dir` so arbitrarily large
/// trees never require a full listing in memory. Symlinks and special
/// files keep their own labels.
fn for_each_target<F>(mount: &MountSpec, visit: &mut F) -> Result<(), LabelError>
where
    F: FnMut(&Path) -> Result<(), LabelError>,
{
    if !mount.selinux_recursive {
        return visit(mount.source_path());
    }
    walk(mount.source_path(), visit)
}

fn walk<F>(dir: &Path, visit: &mut F) -> Result<(), LabelError>
where
    F: FnMut(&Path) -> Result<(), LabelError>,
{
    visit(dir)?;
    let entries = fs::read_dir(dir).map_err(|source| LabelError::Walk {
        path: dir.to_owned(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| LabelError::Walk {
            path: dir.to_owned(),
            source,
        })?;
        let file_type = entry.file_type().map_err(|source| LabelError::Walk {
            path: entry.path(),
            source,
        })?;
        if file_type.is_dir() {
            walk(&entry.path(), visit)?;
        } else if file_type.is_file() {
            visit(&entry.path())?;
        }
    }
    Ok(())
}

/// Rebuild a `user:role:type[:level]` context string with `new_type` in the
/// type position, leaving the other fields untouched. Returns `None` for
/// strings without at least user:role:type fields.
pub fn swap_context_type(context: &str, new_type: &str) -> Option<String> {
    let mut fields: Vec<&str> = context.split(':').collect();
    if fields.len() < 3 {
        return None;
    }
    fields[2] = new_type;
    Some(fields.join(":"))
}

fn relabel_path(path: &Path, context_type: &str) -> Result<(), LabelError> {
    let context = read_context(path)?;
    let updated =
        swap_context_type(&context, context_type).ok_or_else(|| LabelError::MalformedContext {
            path: path.to_owned(),
            context: context.clone(),
        })?;
    if updated != context {
        debug!("relabeling {}: {context} -> {updated}", path.display());
        write_context(path, &updated)?;
    }
    Ok(())
}

fn c_path(path: &Path) -> Result<CString, std::io::Error> {
    CString::new(path.as_os_str().as_bytes()).map_err(|_| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "path contains NUL byte")
    })
}

fn read_context(path: &Path) -> Result<String, LabelError> {
    let read_err = |source| LabelError::ReadContext {
        path: path.to_owned(),
        source,
    };
    let c_path = c_path(path).map_err(read_err)?;
    let c_name = CString::new(SELINUX_XATTR).map_err(|_| {
        read_err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "xattr name contains NUL byte",
        ))
    })?;

    let mut buf = vec![0u8; 128];
    loop {
        // SAFETY: c_path and c_name are valid NUL-terminated strings and buf
        // is a live allocation of buf.len() bytes; lgetxattr writes at most
        // buf.len() bytes and returns the number written.
        #[allow(unsafe_code)]
        let ret = unsafe {
            libc::lgetxattr(
                c_path.as_ptr(),
                c_name.as_ptr(),
                buf.as_mut_ptr().cast(),
                buf.len(),
            )
        };
        if ret >= 0 {
            buf.truncate(ret as usize);
            break;
        }
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::ERANGE) {
            buf.resize(buf.len() * 2, 0);
            continue;
        }
        return Err(read_err(err));
    }

    // The kernel stores the context NUL-terminated.
    if buf.last() == Some(&0) {
        buf.pop();
    }
    String::from_utf8(buf).map_err(|_| {
        read_err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "context is not valid UTF-8",
        ))
    })
}

fn write_context(path: &Path, context: &str) -> Result<(), LabelError> {
    let write_err = |source| LabelError::WriteContext {
        path: path.to_owned(),
        source,
    };
    let c_path = c_path(path).map_err(write_err)?;
    let c_name = CString::new(SELINUX_XATTR).map_err(|_| {
        write_err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "xattr name contains NUL byte",
        ))
    })?;
    let c_value = CString::new(context).map_err(|_| {
        write_err(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "context contains NUL byte",
        ))
    })?;
    let value = c_value.as_bytes_with_nul();

    // SAFETY: c_path and c_name are valid NUL-terminated strings and value
    // points to value.len() live bytes for the duration of the call.
    #[allow(unsafe_code)]
    let ret = unsafe {
        libc::lsetxattr(
            c_path.as_ptr(),
            c_name.as_ptr(),
            value.as_ptr().cast(),
            value.len(),
            0,
        )
    };
    if ret == 0 {
        Ok(())
    } else {
        Err(write_err(std::io::Error::last_os_error()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_replaces_only_the_type_field() {
        assert_eq!(
            swap_context_type("user_u:object_r:unlabeled_t:s0", "container_file_t").as_deref(),
            Some("user_u:object_r:container_file_t:s0")
        );
    }

    #[test]
    fn swap_preserves_mls_range_with_category() {
        assert_eq!(
            swap_context_type(
                "unconfined_u:object_r:user_home_t:s0:c123,c456",
                "container_file_t"
            )
            .as_deref(),
            Some("unconfined_u:object_r:container_file_t:s0:c123,c456")
        );
    }

    #[test]
    fn swap_is_identity_for_correct_type() {
        let context = "user_u:object_r:container_file_t:s0";
        assert_eq!(
            swap_context_type(context, "container_file_t").as_deref(),
            Some(context)
        );
    }

    #[test]
    fn swap_handles_contexts_without_level() {
        assert_eq!(
            swap_context_type("u:r:old_t", "container_file_t").as_deref(),
            Some("u:r:container_file_t")
        );
    }

    #[test]
    fn swap_rejects_malformed_contexts() {
        assert_eq!(swap_context_type("garbage", "container_file_t"), None);
        assert_eq!(swap_context_type("a:b", "container_file_t"), None);
    }

    #[test]
    fn non_recursive_mount_has_exactly_one_target() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("inner.txt"), "x").unwrap();

        let mount = MountSpec::new(dir.path(), "/data").with_selinux_recursive(false);
        let mut targets = Vec::new();
        for_each_target(&mount, &mut |p| {
            targets.push(p.to_owned());
            Ok(())
        })
        .unwrap();

        assert_eq!(targets, vec![dir.path().to_owned()]);
    }

    #[test]
    fn recursive_mount_visits_dirs_and_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.spec"), "x").unwrap();
        fs::create_dir(dir.path().join("SOURCES")).unwrap();
        fs::write(dir.path().join("SOURCES").join("b.tar"), "y").unwrap();

        let mount = MountSpec::new(dir.path(), "/root/rpmbuild");
        let mut targets = Vec::new();
        for_each_target(&mount, &mut |p| {
            targets.push(p.to_owned());
            Ok(())
        })
        .unwrap();

        assert_eq!(targets.len(), 4);
        assert!(targets.contains(&dir.path().to_owned()));
        assert!(targets.contains(&dir.path().join("a.spec")));
        assert!(targets.contains(&dir.path().join("SOURCES")));
        assert!(targets.contains(&dir.path().join("SOURCES").join("b.tar")));
    }

    #[test]
    fn walk_propagates_visitor_errors() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a"), "x").unwrap();

        let mount = MountSpec::new(dir.path(), "/data");
        let result = for_each_target(&mount, &mut |p| {
            Err(LabelError::ReadContext {
                path: p.to_owned(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            })
        });
        assert!(result.is_err());
    }

    #[test]
    fn walk_of_missing_source_fails() {
        let mount = MountSpec::new("/nonexistent/rpmbuild", "/root/rpmbuild");
        let result = for_each_target(&mount, &mut |_| Ok(()));
        assert!(matches!(result, Err(LabelError::Walk { .. })));
    }

    #[test]
    fn unlabeled_mounts_are_skipped_entirely() {
        // Source does not exist; if the policy filter works this never
        // touches the filesystem.
        let mount = MountSpec::new("/nonexistent/nfs", "/src").with_selinux_label(false);
        assert!(relabel_mounts(&[mount]).is_ok());
    }
}
